//! Core data types for Taskdeck.
//!
//! This module defines the task record shared with the remote source and the
//! view state used by the filter pipeline. These types are designed to be:
//!
//! - **Serializable**: Tasks travel as camelCase JSON
//! - **Replaced, not mutated**: Changes are made through copy-with-changes
//!   helpers and handed to the collection as a whole record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a task, assigned by the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new task ID
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// Get the task ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// A single task as held by the collection.
///
/// ## Design Notes
///
/// - Identity is `id`; two tasks with the same id are the same task
/// - `priority` doubles as the priority filter key and is accepted under the
///   legacy `order` key when deserializing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier assigned by the remote source
    pub id: TaskId,

    /// Short title, the only field the search index looks at
    pub title: String,

    /// Longer free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the task is done
    #[serde(default)]
    pub completed: bool,

    /// Importance, also used as a filter key
    #[serde(default, alias = "order", skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Creation time as reported by the remote source
    pub created_at: DateTime<Utc>,

    /// Optional due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new incomplete task created now.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            priority: None,
            created_at: Utc::now(),
            due_date: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Priority rendered the way the priority filter compares it.
    pub fn priority_label(&self) -> Option<String> {
        self.priority.map(|p| p.to_string())
    }
}

/// Fields supplied by the caller when creating a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// Create a new task draft with just a title
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Editable fields of an existing task. `None` keeps the current value.
///
/// The optional fields nest: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<i64>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Returns true if the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Copy of `task` with this patch applied.
    pub fn applied_to(&self, task: &Task) -> Task {
        Task {
            title: self.title.clone().unwrap_or_else(|| task.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| task.description.clone()),
            priority: self.priority.or(task.priority),
            due_date: self.due_date.unwrap_or(task.due_date),
            ..task.clone()
        }
    }
}

/// Completion status filter applied by the filter pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    /// Pass every task
    #[default]
    All,

    /// Keep only completed tasks
    Completed,

    /// Keep only tasks that are not completed
    InProgress,
}

impl StatusFilter {
    /// Check if a task passes this filter.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::InProgress => !task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Completed => write!(f, "completed"),
            StatusFilter::InProgress => write!(f, "inProgress"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "inprogress" | "running" => Ok(StatusFilter::InProgress),
            _ => Err(format!("Unknown status filter: {}", s)),
        }
    }
}

/// View state read by the filter pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text fuzzy search over titles (empty = no search stage)
    pub search_query: String,

    /// Completion status filter
    pub status_filter: StatusFilter,

    /// Exact priority match, compared as a string (empty = no priority stage)
    pub priority_filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_json_shape() {
        let created = DateTime::parse_from_rfc3339("2024-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let task = Task::new("t1", "Write report")
            .with_priority(2)
            .with_created_at(created);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["createdAt"], "2024-03-01T09:00:00Z");
        assert_eq!(json["priority"], 2);
        assert!(json.get("dueDate").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_task_accepts_order_alias() {
        let task: Task = serde_json::from_str(
            r#"{"id":"7","title":"Buy milk","order":3,"createdAt":"2024-03-01T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.priority, Some(3));
        assert!(!task.completed);
        assert_eq!(task.priority_label().as_deref(), Some("3"));
    }

    #[test]
    fn test_patch_keeps_identity_and_unset_fields() {
        let task = Task::new("t1", "Old title")
            .with_description("keep me")
            .with_completed(true);
        let patch = TaskPatch {
            title: Some("New title".to_string()),
            ..Default::default()
        };

        let updated = patch.applied_to(&task);
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.description.as_deref(), Some("keep me"));
        assert!(updated.completed);
        assert_eq!(updated.created_at, task.created_at);
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let task = Task::new("t1", "Call mom")
            .with_description("after work")
            .with_due_date(Utc::now());
        let patch = TaskPatch {
            description: Some(None),
            due_date: Some(None),
            ..Default::default()
        };

        let updated = patch.applied_to(&task);
        assert_eq!(updated.description, None);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.title, "Call mom");
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("inProgress".parse::<StatusFilter>(), Ok(StatusFilter::InProgress));
        assert_eq!("in-progress".parse::<StatusFilter>(), Ok(StatusFilter::InProgress));
        assert_eq!("Completed".parse::<StatusFilter>(), Ok(StatusFilter::Completed));
        assert!("later".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::InProgress.to_string(), "inProgress");
    }

    #[test]
    fn test_status_filter_matches() {
        let open = Task::new("1", "open");
        let done = Task::new("2", "done").with_completed(true);

        assert!(StatusFilter::All.matches(&open));
        assert!(StatusFilter::All.matches(&done));
        assert!(StatusFilter::Completed.matches(&done));
        assert!(!StatusFilter::Completed.matches(&open));
        assert!(StatusFilter::InProgress.matches(&open));
        assert!(!StatusFilter::InProgress.matches(&done));
    }
}
