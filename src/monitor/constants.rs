/// Tick timing
pub mod tick {
    /// Nominal server tick rate in Hz
    pub const RATE: u32 = 20;
    /// Upper bound of the TPS estimate
    pub const MAX_TPS: f64 = 20.0;
    /// Tick-duration samples retained by the estimator
    pub const DURATION_WINDOW: usize = 200;
    /// Samples required before the estimator trusts its window
    pub const WARMUP_SAMPLES: usize = 20;
    /// TPS samples retained for the rolling average
    pub const TPS_HISTORY: usize = 60;
}

/// TPS thresholds
pub mod tps {
    /// Target TPS for a healthy server
    pub const TARGET: f64 = 19.0;
    /// Below this, auto-optimization runs regardless of the interval
    pub const WARNING: f64 = 18.0;
    /// Below this, admins are alerted and emergency recovery starts
    pub const CRITICAL: f64 = 15.0;
}

/// Health scoring
pub mod health {
    /// Health samples retained
    pub const HISTORY: usize = 60;
    /// TPS at or above this scores 100
    pub const EXCELLENT_TPS: f64 = 19.5;
    /// TPS at or above this scores 80
    pub const GOOD_TPS: f64 = 18.0;
    /// TPS at or above this scores 60, anything lower scores 40
    pub const FAIR_TPS: f64 = 15.0;
}

/// View distance (in chunks)
pub mod view_distance {
    pub const BASE: u32 = 8;
    pub const MIN: u32 = 4;
    pub const MAX: u32 = 12;
    /// TPS at or above this raises the view distance by one
    pub const RAISE_TPS: f64 = 19.5;
    /// TPS below this lowers the view distance by one
    pub const LOWER_TPS: f64 = 17.0;
}

/// Chunk and entity cleanup
pub mod cleanup {
    /// Rough chunk footprint per online player (approximation, not an inventory)
    pub const MAX_CHUNKS_PER_PLAYER: u64 = 64;
    /// Estimated chunks tolerated before clearing
    pub const CHUNK_THRESHOLD: u64 = 500;
    /// Chunk threshold while in aggressive mode
    pub const AGGRESSIVE_CHUNK_THRESHOLD: u64 = 300;
    /// Entities reported removed per pass
    pub const ENTITY_BATCH: u64 = 50;
    /// Entities reported removed per pass in aggressive mode
    pub const AGGRESSIVE_ENTITY_BATCH: u64 = 100;
    /// Seconds between forced auto-optimization passes
    pub const OPTIMIZATION_INTERVAL_SECS: u64 = 120;
}

/// Overload protection
pub mod overload {
    pub const PLAYERS_WARNING: usize = 80;
    pub const PLAYERS_CRITICAL: usize = 100;
    pub const CHUNKS_WARNING: u64 = 3000;
    pub const CHUNKS_CRITICAL: u64 = 5000;
}

/// Emergency recovery
pub mod emergency {
    /// Ticks until normal settings are restored (5 minutes at 20 TPS)
    pub const RESTORE_DELAY_TICKS: u64 = 6000;
}

/// Memory monitoring
pub mod memory {
    pub const SAMPLES: usize = 30;
    pub const WARNING_PERCENT: f32 = 80.0;
    pub const CRITICAL_PERCENT: f32 = 90.0;
}

/// Alerting
pub mod alert {
    /// Minimum seconds between two lag alerts
    pub const LAG_COOLDOWN_SECS: u64 = 60;
    /// Ticks after join before an admin gets the TPS greeting
    pub const ADMIN_GREETING_DELAY_TICKS: u64 = 40;
}

/// Task execution monitoring
pub mod task {
    /// Runs longer than this mark a task as slow
    pub const MAX_DURATION_MS: u64 = 50;
    /// Durations retained per task
    pub const SAMPLES: usize = 10;
    /// Consecutive failures before a task is reported as persistently broken
    pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;
}
