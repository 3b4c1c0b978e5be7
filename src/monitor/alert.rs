use std::time::{Duration, Instant};

/// Cooldown gate for one class of admin notification
#[derive(Debug, Clone)]
pub struct AlertCooldown {
    last_fired: Option<Instant>,
    cooldown: Duration,
}

impl AlertCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fired: None,
            cooldown,
        }
    }

    /// Claim the alert slot at `now`. Returns false while cooling down.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }
        self.last_fired = Some(now);
        true
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_alert_fires() {
        let mut cooldown = AlertCooldown::new(Duration::from_secs(60));
        assert!(cooldown.try_fire(Instant::now()));
    }

    #[test]
    fn test_cooldown_blocks_repeat() {
        let start = Instant::now();
        let mut cooldown = AlertCooldown::new(Duration::from_secs(60));

        assert!(cooldown.try_fire(start));
        assert!(!cooldown.try_fire(start + Duration::from_secs(59)));
        assert!(cooldown.try_fire(start + Duration::from_secs(60)));
        assert_eq!(cooldown.last_fired(), Some(start + Duration::from_secs(60)));
    }
}
