//! Error types for Taskdeck core operations.
//!
//! Failures reported by the remote collaborator arrive as `anyhow::Error` and
//! are converted into `SyncError` at the store boundary. Only some kinds are
//! handed back to callers; the rest are recorded in the store's `error` slot.

use crate::types::TaskId;
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

/// Core error types for Taskdeck operations.
#[derive(Error, Debug)]
pub enum SyncError {
    // === Remote Errors ===
    /// Listing tasks from the remote source failed
    #[error("failed to fetch tasks: {reason}")]
    FetchFailed { reason: String },

    /// The remote source rejected or failed a create
    #[error("failed to create task: {reason}")]
    CreateFailed { reason: String },

    /// The remote source rejected or failed an update
    #[error("failed to update task {id}: {reason}")]
    UpdateFailed { id: TaskId, reason: String },

    /// The remote source rejected or failed a delete
    #[error("failed to delete task {id}: {reason}")]
    DeleteFailed { id: TaskId, reason: String },

    /// The remote source rejected or failed a completion toggle
    #[error("failed to toggle task {id}: {reason}")]
    ToggleFailed { id: TaskId, reason: String },

    // === Precondition Errors ===
    /// The task is not present in the local collection
    #[error("task not found: {id}")]
    NotFound { id: TaskId },

    // === Configuration Errors ===
    /// Configuration file parsing or validation failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Short, stable message shown in the store's `error` slot.
    ///
    /// These do not carry the underlying reason so that the presentation
    /// layer can match on them.
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::FetchFailed { .. } => "Failed to fetch tasks",
            SyncError::CreateFailed { .. } => "Failed to create task",
            SyncError::UpdateFailed { .. } => "Failed to update task",
            SyncError::DeleteFailed { .. } => "Failed to delete task",
            SyncError::ToggleFailed { .. } => "Failed to update task status",
            SyncError::NotFound { .. } => "Task not found",
            SyncError::ConfigError { .. } => "Invalid configuration",
            SyncError::Io(_) => "I/O error",
        }
    }

    /// Returns true if this error came from the remote collaborator
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::FetchFailed { .. }
                | SyncError::CreateFailed { .. }
                | SyncError::UpdateFailed { .. }
                | SyncError::DeleteFailed { .. }
                | SyncError::ToggleFailed { .. }
        )
    }
}

/// Render a collaborator error with its full cause chain.
pub(crate) fn reason(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        let err = SyncError::FetchFailed {
            reason: "connection refused".to_string(),
        };
        assert!(err.is_remote());

        let err = SyncError::NotFound {
            id: TaskId::new("42"),
        };
        assert!(!err.is_remote());
    }

    #[test]
    fn test_user_message_is_stable() {
        let a = SyncError::ToggleFailed {
            id: TaskId::new("1"),
            reason: "timeout".to_string(),
        };
        let b = SyncError::ToggleFailed {
            id: TaskId::new("2"),
            reason: "503".to_string(),
        };
        assert_eq!(a.user_message(), b.user_message());
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_reason_includes_context() {
        let err = anyhow::anyhow!("socket closed").context("GET /api/tasks");
        assert_eq!(reason(&err), "GET /api/tasks: socket closed");
    }
}
