//! Undo window for the most recent deletion.
//!
//! `Idle` or `Pending`. Only one deletion is held at a time; starting a new one
//! drops the previous task for good and cancels its expiry.

use std::time::{Duration, Instant};

use crate::task::Task;
use crate::timer::{TimerHandle, Timers};

pub const DEFAULT_UNDO_TIMEOUT: Duration = Duration::from_millis(4000);

#[derive(Debug, Default)]
pub enum UndoWindow {
    #[default]
    Idle,
    Pending {
        task: Task,
        deadline: Instant,
        handle: TimerHandle,
    },
}

impl UndoWindow {
    pub fn pending_task(&self) -> Option<&Task> {
        match self {
            UndoWindow::Pending { task, .. } => Some(task),
            UndoWindow::Idle => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self {
            UndoWindow::Pending { deadline, .. } => Some(*deadline),
            UndoWindow::Idle => None,
        }
    }

    /// Captures a deleted task and schedules its expiry. Returns the task that
    /// was pending before, which is now discarded.
    pub fn begin(
        &mut self,
        task: Task,
        timers: &mut Timers,
        now: Instant,
        timeout: Duration,
    ) -> Option<Task> {
        let replaced = self.cancel(timers);
        if let Some(old) = &replaced {
            tracing::info!(target: "tasktally::undo", id = old.id, "Discarding earlier deletion");
        }

        let deadline = now + timeout;
        let handle = timers.schedule(deadline);
        tracing::debug!(target: "tasktally::undo", id = task.id, "Deletion pending undo");
        *self = UndoWindow::Pending {
            task,
            deadline,
            handle,
        };
        replaced
    }

    /// Hands back the captured task and returns to `Idle`. No-op when idle.
    pub fn undo(&mut self, timers: &mut Timers) -> Option<Task> {
        let task = self.cancel(timers)?;
        tracing::debug!(target: "tasktally::undo", id = task.id, "Deletion undone");
        Some(task)
    }

    /// Handles a fired timer. Only the currently scheduled handle discards.
    pub fn expire(&mut self, fired: TimerHandle) -> Option<Task> {
        match std::mem::take(self) {
            UndoWindow::Pending { task, handle, .. } if handle == fired => {
                tracing::debug!(target: "tasktally::undo", id = task.id, "Deletion finalized");
                Some(task)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    fn cancel(&mut self, timers: &mut Timers) -> Option<Task> {
        match std::mem::take(self) {
            UndoWindow::Pending { task, handle, .. } => {
                timers.cancel(handle);
                Some(task)
            }
            UndoWindow::Idle => None,
        }
    }
}
