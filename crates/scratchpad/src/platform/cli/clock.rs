//! Virtual time clock for deterministic autosave.
//!
//! VirtualClock keeps repeating timers against virtual time that only moves
//! when `advance_by()` is called, so autosave ticks can be driven from tests
//! and from the headless session without real waiting.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::rc::Rc;
use std::time::Duration;

use crate::autosave::{Scheduler, TimerHandle};

type TimerId = u64;

/// Entry for a pending timer.
#[derive(Debug, Clone)]
struct TimerEntry {
    /// When the timer should fire (virtual time in ms)
    fire_at_ms: u64,
    timer_id: TimerId,
    interval_ms: u64,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_ms == other.fire_at_ms && self.timer_id == other.timer_id
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earlier fire time first, registration order breaks ties
        other
            .fire_at_ms
            .cmp(&self.fire_at_ms)
            .then_with(|| other.timer_id.cmp(&self.timer_id))
    }
}

#[derive(Default)]
struct ClockState {
    current_time_ms: u64,
    next_timer_id: TimerId,
    pending_timers: BinaryHeap<TimerEntry>,
    // A timer is live while its id is here; the slot is empty while it runs.
    callbacks: BTreeMap<TimerId, Option<Box<dyn FnMut()>>>,
}

/// Cloning gives another handle to the same clock.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Rc<RefCell<ClockState>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.state.borrow().current_time_ms
    }

    pub fn active_timers(&self) -> usize {
        self.state.borrow().callbacks.len()
    }

    /// Advance virtual time, firing every tick that falls due on the way.
    ///
    /// Returns how many ticks fired. Repeating timers are re-scheduled
    /// immediately so they can fire more than once in a single advance.
    pub fn advance_by(&self, ms: u64) -> usize {
        let target_time = self.state.borrow().current_time_ms + ms;
        let mut fired = 0;

        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                match state.pending_timers.peek() {
                    Some(entry) if entry.fire_at_ms <= target_time => {
                        state.pending_timers.pop()
                    }
                    _ => None,
                }
            };
            let Some(entry) = due else {
                break;
            };

            // Cancelled timers leave stale heap entries behind
            let callback = {
                let mut state = self.state.borrow_mut();
                state.current_time_ms = entry.fire_at_ms;
                state
                    .callbacks
                    .get_mut(&entry.timer_id)
                    .and_then(Option::take)
            };
            let Some(mut callback) = callback else {
                continue;
            };

            // Run without holding the borrow; the callback may touch the clock
            callback();
            fired += 1;

            let mut state = self.state.borrow_mut();
            // Cancelled from inside its own tick
            let Some(slot) = state.callbacks.get_mut(&entry.timer_id) else {
                continue;
            };
            *slot = Some(callback);
            state.pending_timers.push(TimerEntry {
                fire_at_ms: entry.fire_at_ms + entry.interval_ms,
                ..entry
            });
        }

        self.state.borrow_mut().current_time_ms = target_time;
        fired
    }

    /// Get the time until the next live timer fires (if any).
    pub fn time_to_next_timer(&self) -> Option<u64> {
        let state = self.state.borrow();
        state
            .pending_timers
            .iter()
            .filter(|entry| state.callbacks.contains_key(&entry.timer_id))
            .map(|entry| entry.fire_at_ms.saturating_sub(state.current_time_ms))
            .min()
    }
}

impl Scheduler for VirtualClock {
    fn every(&self, interval: Duration, tick: Box<dyn FnMut()>) -> TimerHandle {
        let interval_ms = (interval.as_millis() as u64).max(1);
        let timer_id = {
            let mut state = self.state.borrow_mut();
            let timer_id = state.next_timer_id;
            state.next_timer_id += 1;
            let fire_at_ms = state.current_time_ms + interval_ms;
            state.pending_timers.push(TimerEntry {
                fire_at_ms,
                timer_id,
                interval_ms,
            });
            state.callbacks.insert(timer_id, Some(tick));
            timer_id
        };
        let state = Rc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                let mut state = state.borrow_mut();
                state.callbacks.remove(&timer_id);
                state
                    .pending_timers
                    .retain(|entry| entry.timer_id != timer_id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counting_tick(counter: &Rc<Cell<u32>>) -> Box<dyn FnMut()> {
        let counter = counter.clone();
        Box::new(move || counter.set(counter.get() + 1))
    }

    #[test]
    fn clock_starts_at_zero() {
        let clock = VirtualClock::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn timer_fires_at_deadline() {
        let clock = VirtualClock::new();
        let ticks = Rc::new(Cell::new(0));
        let _handle = clock.every(Duration::from_millis(1000), counting_tick(&ticks));

        // Advance less than interval - no fire
        assert_eq!(clock.advance_by(500), 0);

        // Advance to exactly the deadline
        assert_eq!(clock.advance_by(500), 1);
        assert_eq!(ticks.get(), 1);

        // Timer re-scheduled, fires again at 2000ms
        assert_eq!(clock.advance_by(1000), 1);
        assert_eq!(clock.now_ms(), 2000);
    }

    #[test]
    fn multiple_fires_in_single_advance() {
        let clock = VirtualClock::new();
        let ticks = Rc::new(Cell::new(0));
        let _handle = clock.every(Duration::from_millis(100), counting_tick(&ticks));

        // Fires at 100, 200, 300
        assert_eq!(clock.advance_by(350), 3);
        assert_eq!(ticks.get(), 3);
    }

    #[test]
    fn dropping_handle_cancels_timer() {
        let clock = VirtualClock::new();
        let ticks = Rc::new(Cell::new(0));
        let handle = clock.every(Duration::from_millis(100), counting_tick(&ticks));
        assert_eq!(clock.active_timers(), 1);

        drop(handle);
        assert_eq!(clock.active_timers(), 0);
        assert_eq!(clock.advance_by(1000), 0);
        assert_eq!(ticks.get(), 0);
        assert!(clock.time_to_next_timer().is_none());
    }

    #[test]
    fn time_to_next_timer() {
        let clock = VirtualClock::new();
        assert!(clock.time_to_next_timer().is_none());

        let _handle = clock.every(Duration::from_millis(1000), Box::new(|| {}));
        assert_eq!(clock.time_to_next_timer(), Some(1000));

        clock.advance_by(300);
        assert_eq!(clock.time_to_next_timer(), Some(700));
    }
}
