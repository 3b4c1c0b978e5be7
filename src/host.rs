//! Collaborators supplied by the surrounding game server
//!
//! The optimizer never touches world data directly; it reads the clock and
//! the player list and sends messages through these traits.

use std::sync::Arc;
use std::time::Instant;

/// An online player as seen by the optimizer
pub trait Player: Send + Sync {
    fn name(&self) -> &str;

    /// Operator or holder of the admin permission
    fn is_admin(&self) -> bool;

    /// Chat message
    fn send_message(&self, message: &str) -> anyhow::Result<()>;

    /// Short-lived on-screen popup
    fn send_popup(&self, text: &str) -> anyhow::Result<()>;
}

pub type PlayerRef = Arc<dyn Player>;

/// The host game server
pub trait Host: Send {
    /// Clock used for tick timing, alert cooldowns and optimization intervals
    fn now(&self) -> Instant;

    fn online_players(&self) -> Vec<PlayerRef>;

    fn online_player_count(&self) -> usize {
        self.online_players().len()
    }

    /// Case-insensitive lookup of an online player
    fn find_player(&self, name: &str) -> Option<PlayerRef> {
        self.online_players()
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Hint the process to give back unused memory
    fn reclaim_memory(&self) -> anyhow::Result<()>;

    /// Memory usage in percent, if the host can measure it
    fn memory_usage_percent(&self) -> Option<f32> {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeHost, FakePlayer};
    use super::*;

    #[test]
    fn test_find_player_ignores_case() {
        let host = FakeHost::new();
        host.add_player(FakePlayer::new("Steve", false));

        assert_eq!(host.find_player("steve").unwrap().name(), "Steve");
        assert!(host.find_player("alex").is_none());
    }

    #[test]
    fn test_unreachable_player_fails_to_send() {
        let player = FakePlayer::new("Alex", false);
        *player.unreachable.lock() = true;
        assert!(player.send_message("hi").is_err());
        assert!(player.send_popup("hi").is_err());
    }
}
