//! Cancellable deadlines for the single-threaded event loop.
//!
//! The loop calls [`Timers::fire_due`] on every tick and dispatches whatever
//! comes back. A handle that was cancelled is gone from the queue and can never
//! be returned.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Default)]
pub struct Timers {
    next: u64,
    pending: Vec<(TimerHandle, Instant)>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        self.pending.push((handle, deadline));
        tracing::trace!(target: "tasktally::timer", handle = handle.0, "Scheduled timer");
        handle
    }

    /// Returns whether the handle was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _)| *h != handle);
        let removed = before != self.pending.len();
        if removed {
            tracing::trace!(target: "tasktally::timer", handle = handle.0, "Cancelled timer");
        }
        removed
    }

    /// Removes and returns every handle whose deadline is at or before `now`,
    /// earliest first.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let mut due: Vec<(TimerHandle, Instant)> = Vec::new();
        self.pending.retain(|entry| {
            if entry.1 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(_, deadline)| *deadline);
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline)| *deadline).min()
    }
}
