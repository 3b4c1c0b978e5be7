//! Emergency recovery state machine
//!
//! ```text
//!            overload / critical TPS
//!   Normal ───────────────────────────▶ Emergency
//!     ▲                                    │  (re-trigger: supersede timer)
//!     └──────── restoration timer ─────────┘
//! ```
//!
//! The controller only tracks state. The optimizer performs the entry
//! actions and owns the scheduler that fires the restoration.

use std::time::Instant;

use super::overload::{describe, OverloadReasons};
use crate::tasks::TaskHandle;

/// What pushed the server into emergency mode
#[derive(Debug, Clone, PartialEq)]
pub enum EmergencyTrigger {
    Overload(OverloadReasons),
    CriticalTps(f64),
}

impl EmergencyTrigger {
    pub fn describe(&self) -> String {
        match self {
            EmergencyTrigger::Overload(reasons) => describe(reasons),
            EmergencyTrigger::CriticalTps(tps) => format!("TPS: {:.2}", tps),
        }
    }
}

/// Live emergency episode
#[derive(Debug, Clone)]
pub struct EmergencyState {
    /// View distance in effect before the first entry of this episode
    pub previous_view_distance: u32,
    pub activated_at: Instant,
    /// Most recent trigger
    pub trigger: EmergencyTrigger,
    /// Entries since activation, including the first
    pub entries: u32,
    restore_task: TaskHandle,
}

impl EmergencyState {
    pub fn restore_task(&self) -> TaskHandle {
        self.restore_task
    }
}

#[derive(Debug, Default)]
pub struct EmergencyController {
    state: Option<EmergencyState>,
    activations: u64,
    restorations: u64,
}

impl EmergencyController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter (or re-enter) emergency mode with a freshly scheduled
    /// restoration. Returns the restoration it supersedes, which the caller
    /// must cancel.
    pub fn activate(
        &mut self,
        now: Instant,
        previous_view_distance: u32,
        trigger: EmergencyTrigger,
        restore_task: TaskHandle,
    ) -> Option<TaskHandle> {
        if let Some(state) = self.state.as_mut() {
            state.trigger = trigger;
            state.entries += 1;
            return Some(std::mem::replace(&mut state.restore_task, restore_task));
        }

        self.state = Some(EmergencyState {
            previous_view_distance,
            activated_at: now,
            trigger,
            entries: 1,
            restore_task,
        });
        self.activations += 1;
        None
    }

    /// End the episode if `handle` is its pending restoration.
    /// Stale or unknown handles leave the state untouched.
    pub fn restore(&mut self, handle: TaskHandle) -> Option<EmergencyState> {
        let pending = self
            .state
            .as_ref()
            .is_some_and(|state| state.restore_task == handle);
        if pending {
            self.restorations += 1;
            self.state.take()
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&EmergencyState> {
        self.state.as_ref()
    }

    /// Episodes started since launch
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Episodes ended by their restoration timer
    pub fn restorations(&self) -> u64 {
        self.restorations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TickScheduler;

    fn handles(n: usize) -> Vec<TaskHandle> {
        let mut scheduler = TickScheduler::new();
        (0..n).map(|_| scheduler.schedule_once(1, ())).collect()
    }

    #[test]
    fn test_activate_and_restore() {
        let h = handles(1);
        let mut controller = EmergencyController::new();

        let trigger = EmergencyTrigger::CriticalTps(12.0);
        let superseded = controller.activate(Instant::now(), 10, trigger, h[0]);
        assert!(superseded.is_none());
        assert!(controller.is_active());
        assert_eq!(controller.activations(), 1);

        let state = controller.restore(h[0]).unwrap();
        assert_eq!(state.previous_view_distance, 10);
        assert!(!controller.is_active());
    }

    #[test]
    fn test_retrigger_supersedes_timer() {
        let h = handles(2);
        let mut controller = EmergencyController::new();

        let now = Instant::now();
        controller.activate(now, 10, EmergencyTrigger::CriticalTps(12.0), h[0]);
        let superseded = controller.activate(now, 4, EmergencyTrigger::CriticalTps(11.0), h[1]);

        assert_eq!(superseded, Some(h[0]));
        let state = controller.state().unwrap();
        assert_eq!(state.entries, 2);
        assert_eq!(state.restore_task(), h[1]);
        // Pre-emergency distance comes from the first entry
        assert_eq!(state.previous_view_distance, 10);
        assert_eq!(controller.activations(), 1);
    }

    #[test]
    fn test_stale_handle_does_not_restore() {
        let h = handles(2);
        let mut controller = EmergencyController::new();

        controller.activate(Instant::now(), 8, EmergencyTrigger::CriticalTps(12.0), h[0]);
        controller.activate(Instant::now(), 4, EmergencyTrigger::CriticalTps(12.0), h[1]);

        assert!(controller.restore(h[0]).is_none());
        assert!(controller.is_active());
        assert!(controller.restore(h[1]).is_some());
        assert!(controller.restore(h[1]).is_none());
        assert_eq!(controller.restorations(), 1);
    }

    #[test]
    fn test_trigger_description() {
        let mut reasons = OverloadReasons::new();
        reasons.push(crate::monitor::overload::OverloadReason::Players(150));
        assert_eq!(EmergencyTrigger::Overload(reasons).describe(), "Players: 150");
        assert_eq!(EmergencyTrigger::CriticalTps(9.5).describe(), "TPS: 9.50");
    }
}
