//! Optimistic changes with compensating rollback.
//!
//! An `OptimisticChange` captures a forward edit and its inverse for a single
//! field of a single task. The forward edit is applied to the collection
//! before the remote confirms; the inverse is applied only if confirmation
//! fails. The inverse restores the captured field and nothing else, so edits
//! made to other fields in the meantime survive a rollback.

use crate::collection::TaskCollection;
use crate::types::{Task, TaskId};

/// A single-field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    /// Set the completion flag
    Completed(bool),
}

impl FieldEdit {
    /// Apply the edit to a task copy.
    pub fn apply(&self, task: &mut Task) {
        match *self {
            FieldEdit::Completed(completed) => task.completed = completed,
        }
    }
}

/// Forward and inverse edits for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticChange {
    pub id: TaskId,
    pub forward: FieldEdit,
    pub inverse: FieldEdit,
}

impl OptimisticChange {
    /// Flip the completion flag, remembering its current value.
    pub fn toggle_completed(task: &Task) -> Self {
        OptimisticChange {
            id: task.id.clone(),
            forward: FieldEdit::Completed(!task.completed),
            inverse: FieldEdit::Completed(task.completed),
        }
    }

    /// Apply the forward edit. Returns false if the task is gone.
    pub fn apply(&self, collection: &mut TaskCollection) -> bool {
        collection.modify(&self.id, |task| self.forward.apply(task))
    }

    /// Apply the inverse edit. Returns false if the task is gone.
    pub fn revert(&self, collection: &mut TaskCollection) -> bool {
        collection.modify(&self.id, |task| self.inverse.apply(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_revert() {
        let original = Task::new("1", "Write report").with_priority(2);
        let mut collection = TaskCollection::from_tasks(vec![original.clone()]);
        let change = OptimisticChange::toggle_completed(&original);

        assert!(change.apply(&mut collection));
        assert!(collection.get(&original.id).unwrap().completed);

        assert!(change.revert(&mut collection));
        assert_eq!(collection.get(&original.id).unwrap(), &original);
    }

    #[test]
    fn test_revert_touches_only_captured_field() {
        let original = Task::new("1", "Write report");
        let mut collection = TaskCollection::from_tasks(vec![original.clone()]);
        let change = OptimisticChange::toggle_completed(&original);
        change.apply(&mut collection);

        collection.modify(&original.id, |t| t.title = "Write final report".to_string());
        change.revert(&mut collection);

        let task = collection.get(&original.id).unwrap();
        assert!(!task.completed);
        assert_eq!(task.title, "Write final report");
    }

    #[test]
    fn test_missing_task() {
        let mut collection = TaskCollection::new();
        let change = OptimisticChange::toggle_completed(&Task::new("9", "gone"));

        assert!(!change.apply(&mut collection));
        assert!(!change.revert(&mut collection));
    }
}
