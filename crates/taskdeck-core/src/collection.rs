//! The authoritative in-memory task collection.
//!
//! The collection is an ordered `Vec<Task>` where insertion order is display
//! order. Every mutation keeps task ids unique and bumps a generation counter
//! so derived structures (the search index, change observers) can tell that
//! they are stale.
//!
//! The collection itself knows nothing about the search index; the store is
//! responsible for rebuilding the index after each mutation.

use crate::types::{Task, TaskId};
use std::collections::HashSet;
use tracing::warn;

/// Ordered set of tasks keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    /// Tasks in display order
    tasks: Vec<Task>,

    /// Modification counter
    generation: u64,
}

impl TaskCollection {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from a list, dropping later duplicates.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(tasks);
        collection
    }

    /// Get the number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get the current generation (modification counter).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Borrow the tasks in display order.
    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    /// Read-only copy handed to external readers.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Get a task by its id.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Check if a task with this id exists.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Replace the whole collection.
    ///
    /// If the incoming list repeats an id, the first occurrence wins and the
    /// rest are dropped. Returns the number of dropped duplicates.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> usize {
        let mut seen = HashSet::with_capacity(tasks.len());
        let mut kept = Vec::with_capacity(tasks.len());
        let mut dropped = 0;

        for task in tasks {
            if seen.insert(task.id.clone()) {
                kept.push(task);
            } else {
                warn!(id = %task.id, "Dropping duplicate task id from payload");
                dropped += 1;
            }
        }

        self.tasks = kept;
        self.generation += 1;
        dropped
    }

    /// Insert a task at the end, or replace it in place if the id exists.
    ///
    /// Returns true if the task was newly appended.
    pub fn upsert(&mut self, task: Task) -> bool {
        self.generation += 1;
        match self.position(&task.id) {
            Some(idx) => {
                self.tasks[idx] = task;
                false
            }
            None => {
                self.tasks.push(task);
                true
            }
        }
    }

    /// Replace an existing task with a new copy carrying the same id.
    ///
    /// Returns false (and changes nothing) if the id is not present.
    pub fn replace(&mut self, task: Task) -> bool {
        match self.position(&task.id) {
            Some(idx) => {
                self.tasks[idx] = task;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Replace a task with a modified copy of itself.
    ///
    /// Returns false if the id is not present.
    pub fn modify(&mut self, id: &TaskId, edit: impl FnOnce(&mut Task)) -> bool {
        match self.position(id) {
            Some(idx) => {
                let mut next = self.tasks[idx].clone();
                edit(&mut next);
                next.id = id.clone();
                self.tasks[idx] = next;
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Remove a task by id, returning it.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let idx = self.position(id)?;
        self.generation += 1;
        Some(self.tasks.remove(idx))
    }

    /// Tasks whose `completed` flag is set.
    pub fn completed(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| t.completed).cloned().collect()
    }

    /// Tasks still in progress.
    pub fn running(&self) -> Vec<Task> {
        self.tasks.iter().filter(|t| !t.completed).cloned().collect()
    }

    /// Check the id uniqueness invariant.
    pub fn ids_unique(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        self.tasks.iter().all(|t| seen.insert(&t.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tasks() -> Vec<Task> {
        vec![
            Task::new("1", "Write report"),
            Task::new("2", "Write email").with_completed(true),
            Task::new("3", "Buy milk"),
        ]
    }

    #[test]
    fn test_replace_all_drops_duplicates() {
        let mut collection = TaskCollection::new();
        let mut tasks = make_tasks();
        tasks.push(Task::new("2", "Shadow"));

        let dropped = collection.replace_all(tasks);

        assert_eq!(dropped, 1);
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.get(&TaskId::new("2")).unwrap().title, "Write email");
        assert!(collection.ids_unique());
    }

    #[test]
    fn test_upsert_preserves_order() {
        let mut collection = TaskCollection::from_tasks(make_tasks());

        assert!(!collection.upsert(Task::new("1", "Write final report")));
        assert!(collection.upsert(Task::new("4", "Call mom")));

        let titles: Vec<_> = collection.as_slice().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Write final report", "Write email", "Buy milk", "Call mom"]
        );
        assert!(collection.ids_unique());
    }

    #[test]
    fn test_replace_missing_is_noop() {
        let mut collection = TaskCollection::from_tasks(make_tasks());
        let gen = collection.generation();

        assert!(!collection.replace(Task::new("99", "Ghost")));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.generation(), gen);
    }

    #[test]
    fn test_modify_cannot_change_identity() {
        let mut collection = TaskCollection::from_tasks(make_tasks());
        let id = TaskId::new("3");

        assert!(collection.modify(&id, |t| {
            t.completed = true;
            t.id = TaskId::new("1");
        }));

        assert!(collection.get(&id).unwrap().completed);
        assert!(collection.ids_unique());
    }

    #[test]
    fn test_remove() {
        let mut collection = TaskCollection::from_tasks(make_tasks());

        let removed = collection.remove(&TaskId::new("2")).unwrap();
        assert_eq!(removed.title, "Write email");
        assert_eq!(collection.len(), 2);
        assert!(collection.remove(&TaskId::new("2")).is_none());
    }

    #[test]
    fn test_completed_and_running() {
        let collection = TaskCollection::from_tasks(make_tasks());

        assert_eq!(collection.completed().len(), 1);
        assert_eq!(collection.running().len(), 2);
    }

    #[test]
    fn test_generation_advances() {
        let mut collection = TaskCollection::new();
        let gen1 = collection.generation();

        collection.upsert(Task::new("1", "a"));
        let gen2 = collection.generation();
        collection.remove(&TaskId::new("1"));

        assert!(gen2 > gen1);
        assert!(collection.generation() > gen2);
    }
}
