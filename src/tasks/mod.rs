//! Scheduled work of the optimizer
//!
//! Periodic tasks and their required delay/period pairs (in ticks at a
//! nominal 20 TPS), plus the one-shot follow-ups the optimizer schedules
//! for itself.

pub mod guard;
pub mod profiler;
pub mod scheduler;

pub use guard::{run_guarded, TaskError};
pub use profiler::TaskProfiler;
pub use scheduler::{TaskHandle, TickScheduler};

/// Tasks registered on startup and repeated until shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodicTask {
    /// Every tick: record tick timing, refresh TPS and the chunk estimate
    MonitorPerformance,
    /// Every 10s: emergency recovery on critical TPS
    FastOptimizationCheck,
    /// Every 30s: chunk/entity cleanup when TPS is low or the interval elapsed
    AutoOptimize,
    /// Every 60s: clear estimated chunks above the fixed threshold
    CleanupChunks,
    /// Every 15s: step view distance from TPS
    AdjustViewDistance,
    /// Every 5m: memory reclaim hint
    PeriodicMemoryCleanup,
    /// Every 2s: HUD popup for opted-in players
    UpdatePerformanceDisplay,
    /// Every 3s: player/chunk overload thresholds
    MonitorOverload,
    /// Every 5s: health score
    CheckServerHealth,
    /// Every 10s: memory usage sample
    MonitorMemory,
}

impl PeriodicTask {
    pub const ALL: [PeriodicTask; 10] = [
        PeriodicTask::MonitorPerformance,
        PeriodicTask::FastOptimizationCheck,
        PeriodicTask::AutoOptimize,
        PeriodicTask::CleanupChunks,
        PeriodicTask::AdjustViewDistance,
        PeriodicTask::PeriodicMemoryCleanup,
        PeriodicTask::UpdatePerformanceDisplay,
        PeriodicTask::MonitorOverload,
        PeriodicTask::CheckServerHealth,
        PeriodicTask::MonitorMemory,
    ];

    /// `(delay, period)` in ticks
    pub fn schedule(&self) -> (u64, u64) {
        match self {
            PeriodicTask::MonitorPerformance => (0, 1),
            PeriodicTask::FastOptimizationCheck => (200, 200),
            PeriodicTask::AutoOptimize => (100, 600),
            PeriodicTask::CleanupChunks => (200, 1200),
            PeriodicTask::AdjustViewDistance => (300, 300),
            PeriodicTask::PeriodicMemoryCleanup => (6000, 6000),
            PeriodicTask::UpdatePerformanceDisplay => (40, 40),
            PeriodicTask::MonitorOverload => (60, 60),
            PeriodicTask::CheckServerHealth => (100, 100),
            PeriodicTask::MonitorMemory => (200, 200),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PeriodicTask::MonitorPerformance => "monitor_performance",
            PeriodicTask::FastOptimizationCheck => "fast_optimization_check",
            PeriodicTask::AutoOptimize => "auto_optimize",
            PeriodicTask::CleanupChunks => "cleanup_chunks",
            PeriodicTask::AdjustViewDistance => "adjust_view_distance",
            PeriodicTask::PeriodicMemoryCleanup => "periodic_memory_cleanup",
            PeriodicTask::UpdatePerformanceDisplay => "update_performance_display",
            PeriodicTask::MonitorOverload => "monitor_overload",
            PeriodicTask::CheckServerHealth => "check_server_health",
            PeriodicTask::MonitorMemory => "monitor_memory",
        }
    }
}

/// Anything the optimizer's scheduler can dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Periodic(PeriodicTask),
    /// Leave emergency mode
    RestoreNormal,
    /// Send the TPS greeting to a freshly joined admin
    GreetAdmin(String),
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Periodic(task) => task.name(),
            Task::RestoreNormal => "restore_normal",
            Task::GreetAdmin(_) => "greet_admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_table() {
        assert_eq!(PeriodicTask::MonitorPerformance.schedule(), (0, 1));
        assert_eq!(PeriodicTask::AutoOptimize.schedule(), (100, 600));
        assert_eq!(PeriodicTask::PeriodicMemoryCleanup.schedule(), (6000, 6000));
        assert_eq!(PeriodicTask::MonitorOverload.schedule(), (60, 60));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = PeriodicTask::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PeriodicTask::ALL.len());
    }

    #[test]
    fn test_one_shot_names() {
        assert_eq!(Task::RestoreNormal.name(), "restore_normal");
        assert_eq!(Task::GreetAdmin("Steve".to_string()).name(), "greet_admin");
        assert_eq!(Task::Periodic(PeriodicTask::CleanupChunks).name(), "cleanup_chunks");
    }
}
