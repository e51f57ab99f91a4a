use std::collections::HashSet;

use crate::task::TaskId;

/// Tasks whose reminder banner was dismissed this session. Grow-only and never
/// persisted, so a dismissed task stays quiet even if it is reopened.
#[derive(Debug, Default, Clone)]
pub struct Dismissals {
    ids: HashSet<TaskId>,
}

impl Dismissals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&mut self, id: TaskId) {
        if self.ids.insert(id) {
            tracing::debug!(target: "tasktally::reminder", id, "Reminder dismissed");
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.ids.contains(&id)
    }
}
