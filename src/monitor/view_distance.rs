//! View distance controller
//!
//! Steps the server view distance up or down one chunk at a time from the
//! current TPS, within fixed bounds. A manual override switches automatic
//! adjustment off until it is toggled back on.

use super::constants::{tps, view_distance};

/// Rejected view distance values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewDistanceError {
    #[error("View distance must be between {min}-{max} (got {value})")]
    OutOfRange { value: u32, min: u32, max: u32 },
}

/// Thresholds driving automatic adjustment
#[derive(Debug, Clone, Copy)]
pub struct ViewDistanceBands {
    /// TPS at or above this raises the distance
    pub raise_tps: f64,
    /// TPS below this lowers the distance
    pub lower_tps: f64,
    /// TPS below this drops straight to the minimum
    pub critical_tps: f64,
}

impl Default for ViewDistanceBands {
    fn default() -> Self {
        Self {
            raise_tps: view_distance::RAISE_TPS,
            lower_tps: view_distance::LOWER_TPS,
            critical_tps: tps::CRITICAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewDistanceController {
    current: u32,
    base: u32,
    min: u32,
    max: u32,
    auto: bool,
    bands: ViewDistanceBands,
}

impl ViewDistanceController {
    /// Create a controller starting at `base`. An inverted range collapses to `min`.
    pub fn new(base: u32, min: u32, max: u32, bands: ViewDistanceBands) -> Self {
        let max = max.max(min);
        Self {
            current: base.clamp(min, max),
            base,
            min,
            max,
            auto: true,
            bands,
        }
    }

    /// One automatic adjustment step. Returns the new distance if it changed.
    pub fn adjust(&mut self, tps: f64) -> Option<u32> {
        if !self.auto {
            return None;
        }

        let mut target = self.current;

        if tps >= self.bands.raise_tps && self.current < self.max {
            target = (self.current + 1).min(self.max);
        } else if tps < self.bands.lower_tps && self.current > self.min {
            target = (self.current - 1).max(self.min);
        } else if tps < self.bands.critical_tps {
            // Only reachable once already at the floor; kept as a safeguard
            target = self.min;
        }

        if target == self.current {
            return None;
        }

        self.current = target;
        Some(target)
    }

    /// Manual override; always disables automatic adjustment
    pub fn set(&mut self, value: u32) -> Result<(), ViewDistanceError> {
        if value < self.min || value > self.max {
            return Err(ViewDistanceError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }

        self.current = value;
        self.auto = false;
        Ok(())
    }

    /// Flip automatic adjustment, returning the new state
    pub fn toggle_auto(&mut self) -> bool {
        self.auto = !self.auto;
        self.auto
    }

    /// Drop to the minimum, returning the distance in effect before
    pub fn force_min(&mut self) -> u32 {
        let previous = self.current;
        self.current = self.min;
        previous
    }

    /// Return to the base distance
    pub fn reset_to_base(&mut self) {
        self.current = self.base.clamp(self.min, self.max);
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for ViewDistanceController {
    fn default() -> Self {
        Self::new(
            view_distance::BASE,
            view_distance::MIN,
            view_distance::MAX,
            ViewDistanceBands::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let controller = ViewDistanceController::default();
        assert_eq!(controller.current(), 8);
        assert!(controller.is_auto());
    }

    #[test]
    fn test_inverted_range_collapses_to_min() {
        let mut controller = ViewDistanceController::new(8, 10, 4, ViewDistanceBands::default());
        assert_eq!(controller.current(), 10);
        assert_eq!(controller.max(), 10);
        assert_eq!(controller.adjust(20.0), None);
    }

    #[test]
    fn test_raise_on_excellent_tps() {
        let mut controller = ViewDistanceController::default();
        assert_eq!(controller.adjust(19.8), Some(9));
        assert_eq!(controller.adjust(20.0), Some(10));
    }

    #[test]
    fn test_raise_stops_at_max() {
        let mut controller = ViewDistanceController::default();
        for _ in 0..10 {
            controller.adjust(20.0);
        }
        assert_eq!(controller.current(), 12);
        assert_eq!(controller.adjust(20.0), None);
    }

    #[test]
    fn test_lower_one_step_at_a_time() {
        let mut controller = ViewDistanceController::default();
        // Even critical TPS only steps down by one while above the floor
        assert_eq!(controller.adjust(10.0), Some(7));
        assert_eq!(controller.adjust(16.5), Some(6));
    }

    #[test]
    fn test_lower_stops_at_min() {
        let mut controller = ViewDistanceController::default();
        for _ in 0..10 {
            controller.adjust(12.0);
        }
        assert_eq!(controller.current(), 4);
        assert_eq!(controller.adjust(12.0), None);
    }

    #[test]
    fn test_dead_band_holds() {
        let mut controller = ViewDistanceController::default();
        assert_eq!(controller.adjust(18.0), None);
        assert_eq!(controller.adjust(17.0), None);
        assert_eq!(controller.current(), 8);
    }

    #[test]
    fn test_manual_override() {
        let mut controller = ViewDistanceController::default();

        assert!(matches!(
            controller.set(3),
            Err(ViewDistanceError::OutOfRange { value: 3, min: 4, max: 12 })
        ));
        assert!(controller.set(13).is_err());
        assert!(controller.is_auto());
        assert_eq!(controller.current(), 8);

        controller.set(10).unwrap();
        assert_eq!(controller.current(), 10);
        assert!(!controller.is_auto());

        // Manual mode ignores TPS
        assert_eq!(controller.adjust(5.0), None);
        assert_eq!(controller.current(), 10);
    }

    #[test]
    fn test_toggle_auto() {
        let mut controller = ViewDistanceController::default();
        assert!(!controller.toggle_auto());
        assert!(controller.toggle_auto());
    }

    #[test]
    fn test_force_min_and_reset() {
        let mut controller = ViewDistanceController::default();
        controller.set(11).unwrap();

        assert_eq!(controller.force_min(), 11);
        assert_eq!(controller.current(), 4);

        controller.reset_to_base();
        assert_eq!(controller.current(), 8);
    }

    proptest! {
        #[test]
        fn prop_stays_in_bounds(readings in proptest::collection::vec(0.0f64..25.0, 0..200)) {
            let mut controller = ViewDistanceController::default();
            for tps in readings {
                controller.adjust(tps);
                prop_assert!(controller.current() >= 4 && controller.current() <= 12);
            }
        }

        #[test]
        fn prop_non_increasing_under_low_tps(
            readings in proptest::collection::vec(0.0f64..16.99, 1..50)
        ) {
            let mut controller = ViewDistanceController::default();
            let mut previous = controller.current();
            for tps in readings {
                controller.adjust(tps);
                prop_assert!(controller.current() <= previous);
                previous = controller.current();
            }
        }

        #[test]
        fn prop_non_decreasing_under_high_tps(
            readings in proptest::collection::vec(19.5f64..25.0, 1..50)
        ) {
            let mut controller = ViewDistanceController::default();
            let mut previous = controller.current();
            for tps in readings {
                controller.adjust(tps);
                prop_assert!(controller.current() >= previous);
                previous = controller.current();
            }
        }
    }
}
