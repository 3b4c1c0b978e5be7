//! Ticks-per-second estimation
//!
//! Tracks the wall-clock gap between consecutive ticks and turns it into a
//! bounded TPS value used by every control policy:
//! - Health scoring
//! - View distance scaling
//! - Emergency recovery and lag alerts

use std::time::{Duration, Instant};

use super::constants::tick;
use super::window::SampleWindow;

/// Rolling TPS estimator fed once per server tick
#[derive(Debug)]
pub struct TpsEstimator {
    /// Rolling window of gaps between consecutive ticks
    tick_durations: SampleWindow<Duration>,
    /// Computed TPS values, one per recorded tick
    tps_history: SampleWindow<f64>,
    /// When the previous tick was observed
    last_tick: Instant,
}

impl TpsEstimator {
    pub fn new(started_at: Instant) -> Self {
        Self {
            tick_durations: SampleWindow::new(tick::DURATION_WINDOW),
            tps_history: SampleWindow::new(tick::TPS_HISTORY),
            last_tick: started_at,
        }
    }

    /// Record a tick observed at `now` and return the gap since the previous one
    pub fn record_tick(&mut self, now: Instant) -> Duration {
        let duration = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.record_duration(duration);
        duration
    }

    /// Push a raw tick duration into the window
    pub fn record_duration(&mut self, duration: Duration) {
        self.tick_durations.push(duration);
    }

    /// Current TPS over the whole retained window, capped at 20.
    ///
    /// Reports a healthy 20.0 until enough samples exist so a fresh server
    /// does not raise alarms during warm-up.
    pub fn calculate_tps(&self) -> f64 {
        if self.tick_durations.len() < tick::WARMUP_SAMPLES {
            return tick::MAX_TPS;
        }

        let avg = self.average_tick_duration().as_secs_f64();
        if avg == 0.0 {
            return tick::MAX_TPS;
        }

        (1.0 / avg).min(tick::MAX_TPS)
    }

    /// Compute the current TPS and append it to the history window
    pub fn sample(&mut self) -> f64 {
        let tps = self.calculate_tps();
        self.tps_history.push(tps);
        tps
    }

    /// Mean of the recent TPS history, 20.0 when nothing was sampled yet
    pub fn average_tps(&self) -> f64 {
        self.tps_history.mean().unwrap_or(tick::MAX_TPS)
    }

    /// Get average tick duration
    pub fn average_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.tick_durations.iter().sum();
        sum / self.tick_durations.len() as u32
    }

    /// Get the 95th percentile tick duration
    pub fn p95_tick_duration(&self) -> Duration {
        if self.tick_durations.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.tick_durations.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted.get(idx.min(sorted.len() - 1)).copied().unwrap_or(Duration::ZERO)
    }

    /// Number of tick durations currently retained
    pub fn sample_count(&self) -> usize {
        self.tick_durations.len()
    }
}
