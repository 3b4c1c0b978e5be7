use std::str::FromStr;
use std::time::Duration;

use crate::monitor::constants::{
    alert, cleanup, emergency, memory, overload, task, tps, view_distance,
};
use crate::monitor::optimize::CleanupThresholds;
use crate::monitor::overload::OverloadThresholds;
use crate::monitor::view_distance::ViewDistanceBands;

/// Optimizer configuration
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Run the automatic optimization tasks
    pub auto_optimize: bool,
    /// TPS considered healthy
    pub tps_target: f64,
    /// TPS below which auto-optimization runs early
    pub tps_warning: f64,
    /// TPS below which admins are alerted and emergency recovery starts
    pub tps_critical: f64,
    /// View distance restored after an emergency
    pub base_view_distance: u32,
    pub min_view_distance: u32,
    pub max_view_distance: u32,
    /// TPS at or above which view distance is raised
    pub view_raise_tps: f64,
    /// TPS below which view distance is lowered
    pub view_lower_tps: f64,
    pub chunk_threshold: u64,
    pub aggressive_chunk_threshold: u64,
    pub entity_batch: u64,
    pub aggressive_entity_batch: u64,
    /// Chunk estimate per online player
    pub max_chunks_per_player: u64,
    /// Forced auto-optimization interval
    pub optimization_interval: Duration,
    pub max_players_warning: usize,
    pub max_players_critical: usize,
    pub max_chunks_warning: u64,
    pub max_chunks_critical: u64,
    pub memory_warning_percent: f32,
    pub memory_critical_percent: f32,
    /// Minimum gap between two lag alerts
    pub lag_alert_cooldown: Duration,
    /// Ticks until emergency settings are rolled back
    pub emergency_restore_delay_ticks: u64,
    /// Ticks between an admin joining and the TPS greeting
    pub admin_greeting_delay_ticks: u64,
    /// Runs longer than this mark a task as slow
    pub max_task_duration: Duration,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            auto_optimize: true,
            tps_target: tps::TARGET,
            tps_warning: tps::WARNING,
            tps_critical: tps::CRITICAL,
            base_view_distance: view_distance::BASE,
            min_view_distance: view_distance::MIN,
            max_view_distance: view_distance::MAX,
            view_raise_tps: view_distance::RAISE_TPS,
            view_lower_tps: view_distance::LOWER_TPS,
            chunk_threshold: cleanup::CHUNK_THRESHOLD,
            aggressive_chunk_threshold: cleanup::AGGRESSIVE_CHUNK_THRESHOLD,
            entity_batch: cleanup::ENTITY_BATCH,
            aggressive_entity_batch: cleanup::AGGRESSIVE_ENTITY_BATCH,
            max_chunks_per_player: cleanup::MAX_CHUNKS_PER_PLAYER,
            optimization_interval: Duration::from_secs(cleanup::OPTIMIZATION_INTERVAL_SECS),
            max_players_warning: overload::PLAYERS_WARNING,
            max_players_critical: overload::PLAYERS_CRITICAL,
            max_chunks_warning: overload::CHUNKS_WARNING,
            max_chunks_critical: overload::CHUNKS_CRITICAL,
            memory_warning_percent: memory::WARNING_PERCENT,
            memory_critical_percent: memory::CRITICAL_PERCENT,
            lag_alert_cooldown: Duration::from_secs(alert::LAG_COOLDOWN_SECS),
            emergency_restore_delay_ticks: emergency::RESTORE_DELAY_TICKS,
            admin_greeting_delay_ticks: alert::ADMIN_GREETING_DELAY_TICKS,
            max_task_duration: Duration::from_millis(task::MAX_DURATION_MS),
        }
    }
}

/// Parse `key` from the environment, keeping `current` when unset or invalid
fn env_override<T: FromStr>(key: &str, current: T, valid: impl Fn(&T) -> bool) -> T {
    let Ok(raw) = std::env::var(key) else {
        return current;
    };

    match raw.parse::<T>() {
        Ok(parsed) if valid(&parsed) => parsed,
        Ok(_) => {
            tracing::warn!("{} '{}' is out of range, using default", key, raw);
            current
        }
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            current
        }
    }
}

impl OptimizerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        config.auto_optimize = env_override("AUTO_OPTIMIZE", config.auto_optimize, |_| true);
        config.base_view_distance =
            env_override("BASE_VIEW_DISTANCE", config.base_view_distance, |v| *v > 0 && *v <= 32);
        config.min_view_distance =
            env_override("MIN_VIEW_DISTANCE", config.min_view_distance, |v| *v > 0 && *v <= 32);
        config.max_view_distance =
            env_override("MAX_VIEW_DISTANCE", config.max_view_distance, |v| *v > 0 && *v <= 32);

        let interval = env_override(
            "OPTIMIZATION_INTERVAL_SECS",
            config.optimization_interval.as_secs(),
            |v| *v > 0,
        );
        config.optimization_interval = Duration::from_secs(interval);

        let cooldown = env_override(
            "LAG_ALERT_COOLDOWN_SECS",
            config.lag_alert_cooldown.as_secs(),
            |v| *v > 0,
        );
        config.lag_alert_cooldown = Duration::from_secs(cooldown);

        config.max_players_critical =
            env_override("MAX_PLAYERS_CRITICAL", config.max_players_critical, |v| *v > 0);
        config.max_chunks_critical =
            env_override("MAX_CHUNKS_CRITICAL", config.max_chunks_critical, |v| *v > 0);

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.min_view_distance == 0 {
            return Err("min_view_distance must be at least 1".to_string());
        }
        if self.min_view_distance > self.base_view_distance
            || self.base_view_distance > self.max_view_distance
        {
            return Err(format!(
                "view distances must satisfy min <= base <= max (got {} <= {} <= {})",
                self.min_view_distance, self.base_view_distance, self.max_view_distance
            ));
        }
        if self.aggressive_chunk_threshold > self.chunk_threshold {
            return Err("aggressive_chunk_threshold cannot exceed chunk_threshold".to_string());
        }
        if self.tps_critical > self.tps_warning {
            return Err("tps_critical cannot exceed tps_warning".to_string());
        }
        if self.lag_alert_cooldown.is_zero() {
            return Err("lag_alert_cooldown must be non-zero".to_string());
        }
        if self.optimization_interval.is_zero() {
            return Err("optimization_interval must be non-zero".to_string());
        }
        Ok(())
    }

    pub fn view_distance_bands(&self) -> ViewDistanceBands {
        ViewDistanceBands {
            raise_tps: self.view_raise_tps,
            lower_tps: self.view_lower_tps,
            critical_tps: self.tps_critical,
        }
    }

    pub fn cleanup_thresholds(&self) -> CleanupThresholds {
        CleanupThresholds {
            chunk_threshold: self.chunk_threshold,
            aggressive_chunk_threshold: self.aggressive_chunk_threshold,
            entity_batch: self.entity_batch,
            aggressive_entity_batch: self.aggressive_entity_batch,
            max_chunks_per_player: self.max_chunks_per_player,
            optimization_interval: self.optimization_interval,
        }
    }

    pub fn overload_thresholds(&self) -> OverloadThresholds {
        OverloadThresholds {
            players_warning: self.max_players_warning,
            players_critical: self.max_players_critical,
            chunks_warning: self.max_chunks_warning,
            chunks_critical: self.max_chunks_critical,
            memory_critical_percent: self.memory_critical_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert!(config.auto_optimize);
        assert_eq!(config.base_view_distance, 8);
        assert_eq!(config.min_view_distance, 4);
        assert_eq!(config.max_view_distance, 12);
        assert_eq!(config.tps_critical, 15.0);
        assert_eq!(config.lag_alert_cooldown, Duration::from_secs(60));
        assert_eq!(config.emergency_restore_delay_ticks, 6000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = OptimizerConfig::load_or_default();
        assert!(config.max_view_distance > 0);
    }

    #[test]
    fn test_validate_view_distance_order() {
        let config = OptimizerConfig {
            base_view_distance: 14,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OptimizerConfig {
            min_view_distance: 0,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        let config = OptimizerConfig {
            aggressive_chunk_threshold: 600,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OptimizerConfig {
            lag_alert_cooldown: Duration::ZERO,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_thresholds() {
        let config = OptimizerConfig::default();
        assert_eq!(config.cleanup_thresholds().chunk_threshold, 500);
        assert_eq!(config.overload_thresholds().players_critical, 100);
        assert_eq!(config.view_distance_bands().lower_tps, 17.0);
    }
}
