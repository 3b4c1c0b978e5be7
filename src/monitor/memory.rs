//! Memory usage sampling
//!
//! Hosts without a memory source report nothing and the monitor stays idle.

use super::constants::memory;
use super::window::SampleWindow;

/// Severity of a memory sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug)]
pub struct MemoryMonitor {
    samples: SampleWindow<f64>,
    warning_percent: f32,
    critical_percent: f32,
}

impl MemoryMonitor {
    pub fn new(warning_percent: f32, critical_percent: f32) -> Self {
        Self {
            samples: SampleWindow::new(memory::SAMPLES),
            warning_percent,
            critical_percent,
        }
    }

    /// Record a usage percentage and classify it
    pub fn record(&mut self, percent: f32) -> MemoryPressure {
        self.samples.push(percent as f64);
        if percent >= self.critical_percent {
            MemoryPressure::Critical
        } else if percent >= self.warning_percent {
            MemoryPressure::Warning
        } else {
            MemoryPressure::Normal
        }
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.latest().map(|v| *v as f32)
    }

    pub fn average(&self) -> Option<f32> {
        self.samples.mean().map(|v| v as f32)
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new(memory::WARNING_PERCENT, memory::CRITICAL_PERCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_levels() {
        let mut monitor = MemoryMonitor::default();
        assert_eq!(monitor.record(50.0), MemoryPressure::Normal);
        assert_eq!(monitor.record(80.0), MemoryPressure::Warning);
        assert_eq!(monitor.record(92.5), MemoryPressure::Critical);
        assert_eq!(monitor.latest(), Some(92.5));
    }

    #[test]
    fn test_empty_monitor() {
        let monitor = MemoryMonitor::default();
        assert_eq!(monitor.latest(), None);
        assert_eq!(monitor.average(), None);
    }

    #[test]
    fn test_average() {
        let mut monitor = MemoryMonitor::default();
        monitor.record(40.0);
        monitor.record(60.0);
        assert_eq!(monitor.average(), Some(50.0));
    }
}
