//! Execution time and failure tracking per task

use std::time::Duration;

use hashbrown::{HashMap, HashSet};
use tracing::{error, warn};

use crate::monitor::constants::task;
use crate::monitor::window::SampleWindow;

#[derive(Debug)]
pub struct TaskProfiler {
    durations: HashMap<&'static str, SampleWindow<Duration>>,
    slow_tasks: HashSet<&'static str>,
    consecutive_failures: HashMap<&'static str, u32>,
    max_duration: Duration,
    max_consecutive_failures: u32,
}

impl TaskProfiler {
    pub fn new(max_duration: Duration) -> Self {
        Self {
            durations: HashMap::new(),
            slow_tasks: HashSet::new(),
            consecutive_failures: HashMap::new(),
            max_duration,
            max_consecutive_failures: task::MAX_CONSECUTIVE_ERRORS,
        }
    }

    /// Record how long a run of `name` took
    pub fn record_duration(&mut self, name: &'static str, duration: Duration) {
        self.durations
            .entry(name)
            .or_insert_with(|| SampleWindow::new(task::SAMPLES))
            .push(duration);

        if duration > self.max_duration {
            if self.slow_tasks.insert(name) {
                warn!(
                    "Slow task detected: {} took {:.4}s",
                    name,
                    duration.as_secs_f64()
                );
            }
        } else {
            self.slow_tasks.remove(name);
        }
    }

    /// Record whether a run of `name` completed
    pub fn record_outcome(&mut self, name: &'static str, success: bool) {
        if success {
            self.consecutive_failures.remove(name);
            return;
        }

        let failures = self.consecutive_failures.entry(name).or_insert(0);
        *failures += 1;
        if *failures == self.max_consecutive_failures {
            error!(
                "Task {} has failed {} times in a row; it keeps running",
                name, failures
            );
        }
    }

    /// Names of tasks whose last run exceeded the budget, sorted
    pub fn slow_tasks(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.slow_tasks.iter().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn consecutive_failures(&self, name: &str) -> u32 {
        self.consecutive_failures.get(name).copied().unwrap_or(0)
    }

    /// Mean of the retained durations for `name`
    pub fn average_duration(&self, name: &str) -> Option<Duration> {
        let window = self.durations.get(name)?;
        if window.is_empty() {
            return None;
        }
        let sum: Duration = window.iter().sum();
        Some(sum / window.len() as u32)
    }

    /// Task with the highest average duration; ties go to the first name
    pub fn slowest_task(&self) -> Option<(&'static str, Duration)> {
        let mut names: Vec<_> = self.durations.keys().copied().collect();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|name| Some((name, self.average_duration(name)?)))
            .fold(None, |slowest, (name, avg)| match slowest {
                Some((_, best)) if best >= avg => slowest,
                _ => Some((name, avg)),
            })
    }
}

impl Default for TaskProfiler {
    fn default() -> Self {
        Self::new(Duration::from_millis(task::MAX_DURATION_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_task_enters_and_leaves() {
        let mut profiler = TaskProfiler::default();

        profiler.record_duration("cleanup_chunks", Duration::from_millis(80));
        assert_eq!(profiler.slow_tasks(), vec!["cleanup_chunks"]);

        profiler.record_duration("cleanup_chunks", Duration::from_millis(5));
        assert!(profiler.slow_tasks().is_empty());
    }

    #[test]
    fn test_slowest_task_by_average() {
        let mut profiler = TaskProfiler::default();
        assert_eq!(profiler.slowest_task(), None);

        profiler.record_duration("cleanup_chunks", Duration::from_millis(4));
        profiler.record_duration("monitor_overload", Duration::from_millis(10));
        profiler.record_duration("monitor_overload", Duration::from_millis(2));

        assert_eq!(
            profiler.slowest_task(),
            Some(("monitor_overload", Duration::from_millis(6)))
        );
    }

    #[test]
    fn test_average_duration_uses_recent_runs() {
        let mut profiler = TaskProfiler::default();
        for _ in 0..20 {
            profiler.record_duration("monitor_performance", Duration::from_millis(100));
        }
        for _ in 0..10 {
            profiler.record_duration("monitor_performance", Duration::from_millis(2));
        }

        assert_eq!(
            profiler.average_duration("monitor_performance"),
            Some(Duration::from_millis(2))
        );
        assert_eq!(profiler.average_duration("unknown"), None);
    }

    #[test]
    fn test_consecutive_failures_reset_on_success() {
        let mut profiler = TaskProfiler::default();
        for _ in 0..6 {
            profiler.record_outcome("monitor_overload", false);
        }
        assert_eq!(profiler.consecutive_failures("monitor_overload"), 6);

        profiler.record_outcome("monitor_overload", true);
        assert_eq!(profiler.consecutive_failures("monitor_overload"), 0);
    }
}
