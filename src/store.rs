use crate::storage::{Slot, StorageError};
use crate::task::{Task, TaskId};
use chrono::NaiveDate;

/// Outcome of flipping a task's completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Completed,
    Reopened,
}

/// Ordered, write-through task collection. The only owner of `Task` values.
pub struct TaskStore {
    tasks: Vec<Task>,
    slot: Box<dyn Slot>,
}

impl TaskStore {
    /// Reads the slot; absent or unparsable content yields an empty store.
    pub fn load(slot: Box<dyn Slot>) -> Self {
        let tasks = match read_tasks(slot.as_ref()) {
            Ok(tasks) => {
                tracing::info!(target: "tasktally::store", count = tasks.len(), "Loaded tasks");
                tasks
            }
            Err(err) => {
                tracing::warn!(
                    target: "tasktally::store",
                    error = %err,
                    "Stored tasks unreadable, starting empty"
                );
                Vec::new()
            }
        };
        Self { tasks, slot }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Appends a new task. Blank names are ignored.
    pub fn add(
        &mut self,
        name: &str,
        description: &str,
        due_date: Option<NaiveDate>,
        now_ms: i64,
    ) -> Option<TaskId> {
        if name.trim().is_empty() {
            tracing::debug!(target: "tasktally::store", "Ignoring task with blank name");
            return None;
        }

        let id = self.next_id(now_ms);
        self.tasks
            .push(Task::new(id, name.to_string(), description.to_string(), due_date));
        tracing::debug!(target: "tasktally::store", id, "Added task");
        self.persist();
        Some(id)
    }

    pub fn toggle(&mut self, id: TaskId) -> Option<Transition> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        let transition = if task.completed {
            Transition::Completed
        } else {
            Transition::Reopened
        };
        tracing::debug!(target: "tasktally::store", id, ?transition, "Toggled task");
        self.persist();
        Some(transition)
    }

    pub fn delete(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(index);
        tracing::debug!(target: "tasktally::store", id, "Deleted task");
        self.persist();
        Some(task)
    }

    /// Puts a previously removed task back at the front.
    pub fn restore(&mut self, task: Task) {
        if self.get(task.id).is_some() {
            tracing::warn!(target: "tasktally::store", id = task.id, "Task already present, not restoring");
            return;
        }
        tracing::debug!(target: "tasktally::store", id = task.id, "Restored task");
        self.tasks.insert(0, task);
        self.persist();
    }

    // Time-derived ids; bumped past the newest id when two adds share a millisecond.
    fn next_id(&self, now_ms: i64) -> TaskId {
        match self.tasks.iter().map(|t| t.id).max() {
            Some(max) if max >= now_ms => max + 1,
            _ => now_ms,
        }
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.tasks)
            .map_err(StorageError::from)
            .and_then(|json| self.slot.write(&json));
        if let Err(err) = result {
            tracing::error!(target: "tasktally::store", error = %err, "Failed to save tasks");
        }
    }
}

fn read_tasks(slot: &dyn Slot) -> Result<Vec<Task>, StorageError> {
    match slot.read()? {
        Some(data) => Ok(serde_json::from_str(&data)?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlot;

    fn store_with(slot: &MemorySlot) -> TaskStore {
        TaskStore::load(Box::new(slot.clone()))
    }

    #[test]
    fn test_load_absent_is_empty() {
        let store = store_with(&MemorySlot::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let store = store_with(&MemorySlot::with_contents("{not json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_reads_persisted_tasks() {
        let slot = MemorySlot::with_contents(
            r#"[{"id":5,"name":"a","description":"","completed":true}]"#,
        );
        let store = store_with(&slot);
        assert_eq!(store.len(), 1);
        assert!(store.get(5).unwrap().completed);
    }

    #[test]
    fn test_add_appends_and_persists() {
        let slot = MemorySlot::new();
        let mut store = store_with(&slot);

        let first = store.add("first", "", None, 1_000).unwrap();
        let second = store.add("second", "desc", None, 2_000).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.tasks()[0].id, first);
        assert_eq!(store.tasks()[1].id, second);
        assert!(!store.tasks()[1].completed);

        let reloaded = store_with(&slot);
        assert_eq!(reloaded.tasks(), store.tasks());
    }

    #[test]
    fn test_add_rejects_blank_name() {
        let slot = MemorySlot::new();
        let mut store = store_with(&slot);
        assert!(store.add("   ", "desc", None, 1_000).is_none());
        assert!(store.is_empty());
        assert!(slot.contents().is_none());
    }

    #[test]
    fn test_add_keeps_ids_unique_within_same_millisecond() {
        let mut store = store_with(&MemorySlot::new());
        let a = store.add("a", "", None, 1_000).unwrap();
        let b = store.add("b", "", None, 1_000).unwrap();
        let c = store.add("c", "", None, 999).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_toggle_reports_transition() {
        let mut store = store_with(&MemorySlot::new());
        let id = store.add("a", "", None, 1_000).unwrap();
        let before = store.get(id).cloned().unwrap();

        assert_eq!(store.toggle(id), Some(Transition::Completed));
        assert_eq!(store.toggle(id), Some(Transition::Reopened));
        assert_eq!(store.get(id), Some(&before));
        assert_eq!(store.toggle(42), None);
    }

    #[test]
    fn test_toggle_and_delete_write_through() {
        let slot = MemorySlot::new();
        let mut store = store_with(&slot);
        let kept = store.add("kept", "", None, 1_000).unwrap();
        let dropped = store.add("dropped", "", None, 2_000).unwrap();

        store.toggle(kept);
        let reloaded = store_with(&slot);
        assert!(reloaded.get(kept).unwrap().completed);

        store.delete(dropped);
        let reloaded = store_with(&slot);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get(dropped).is_none());
        assert!(reloaded.get(kept).unwrap().completed);
    }

    #[test]
    fn test_delete_and_restore_to_front() {
        let mut store = store_with(&MemorySlot::new());
        let a = store.add("a", "", None, 1_000).unwrap();
        let b = store.add("b", "", None, 2_000).unwrap();
        let c = store.add("c", "", None, 3_000).unwrap();

        let removed = store.delete(c).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.delete(c).is_none());

        store.restore(removed.clone());
        let ids: Vec<_> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c, a, b]);
        assert_eq!(store.get(c), Some(&removed));
    }
}
