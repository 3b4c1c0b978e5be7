//! Tick-driven task scheduler
//!
//! Tasks are plain values (not closures) so the owner can dispatch them with
//! full mutable access to its own state. Delays and periods are in ticks.

use std::collections::BTreeMap;

/// Handle to a scheduled entry, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    task: T,
    next_run: u64,
    /// `None` for one-shot entries
    period: Option<u64>,
}

/// Schedules tasks against a monotonically advancing tick counter
#[derive(Debug)]
pub struct TickScheduler<T> {
    entries: BTreeMap<TaskHandle, Entry<T>>,
    current_tick: u64,
    next_id: u64,
}

impl<T: Clone> TickScheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            current_tick: 0,
            next_id: 1,
        }
    }

    /// Run `task` once, `delay` ticks from now
    pub fn schedule_once(&mut self, delay: u64, task: T) -> TaskHandle {
        self.insert(task, delay, None)
    }

    /// Run `task` first after `delay` ticks, then every `period` ticks
    pub fn schedule_repeating(&mut self, delay: u64, period: u64, task: T) -> TaskHandle {
        self.insert(task, delay, Some(period.max(1)))
    }

    fn insert(&mut self, task: T, delay: u64, period: Option<u64>) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle,
            Entry {
                task,
                next_run: self.current_tick + delay,
                period,
            },
        );
        handle
    }

    /// Cancel a pending entry. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// Drop every pending entry
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Advance one tick and return the entries due on it, in scheduling order
    pub fn advance(&mut self) -> Vec<(TaskHandle, T)> {
        self.current_tick += 1;
        let now = self.current_tick;

        let mut due = Vec::new();
        let mut finished = Vec::new();

        for (handle, entry) in self.entries.iter_mut() {
            if entry.next_run > now {
                continue;
            }
            due.push((*handle, entry.task.clone()));
            match entry.period {
                Some(period) => entry.next_run = now + period,
                None => finished.push(*handle),
            }
        }

        for handle in finished {
            self.entries.remove(&handle);
        }

        due
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }
}

impl<T: Clone> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(
        scheduler: &mut TickScheduler<&'static str>,
        ticks: u64,
    ) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        for _ in 0..ticks {
            for (_, task) in scheduler.advance() {
                fired.push((scheduler.current_tick(), task));
            }
        }
        fired
    }

    #[test]
    fn test_zero_delay_runs_on_first_tick() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_repeating(0, 1, "every");

        let fired = run_ticks(&mut scheduler, 3);
        assert_eq!(fired, vec![(1, "every"), (2, "every"), (3, "every")]);
    }

    #[test]
    fn test_delay_and_period() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_repeating(5, 10, "periodic");

        let fired = run_ticks(&mut scheduler, 30);
        assert_eq!(fired, vec![(5, "periodic"), (15, "periodic"), (25, "periodic")]);
    }

    #[test]
    fn test_one_shot_runs_once() {
        let mut scheduler = TickScheduler::new();
        let handle = scheduler.schedule_once(3, "once");

        assert!(scheduler.is_pending(handle));
        let fired = run_ticks(&mut scheduler, 10);
        assert_eq!(fired, vec![(3, "once")]);
        assert!(!scheduler.is_pending(handle));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = TickScheduler::new();
        let handle = scheduler.schedule_once(3, "cancelled");

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(run_ticks(&mut scheduler, 10).is_empty());
    }

    #[test]
    fn test_due_entries_keep_scheduling_order() {
        let mut scheduler = TickScheduler::new();
        scheduler.schedule_repeating(2, 2, "first");
        scheduler.schedule_once(2, "second");

        let fired = run_ticks(&mut scheduler, 2);
        assert_eq!(fired, vec![(2, "first"), (2, "second")]);
    }

    #[test]
    fn test_schedule_relative_to_current_tick() {
        let mut scheduler = TickScheduler::new();
        run_ticks(&mut scheduler, 100);
        scheduler.schedule_once(10, "later");

        let fired = run_ticks(&mut scheduler, 20);
        assert_eq!(fired, vec![(110, "later")]);
    }
}
