//! Remote collaborator interface.
//!
//! This module defines the abstract interface to the remote task source. The
//! store interacts with the remote only through the `TaskRemote` trait; the
//! actual transport (HTTP client, file, in-process) lives with the
//! implementation.
//!
//! ## Implementing a New Remote
//!
//! 1. Implement `TaskRemote` for your transport
//! 2. Map each operation onto its `Route` (method and path)
//! 3. Return `anyhow::Error` with enough context to log; the store converts
//!    it into the matching `SyncError` kind
//!
//! Retry and backoff belong in the implementation, not in the store.

use crate::types::{NewTask, Task, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// The five operations the remote source exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    List,
    Create,
    Toggle,
    Update,
    Delete,
}

impl RemoteOp {
    /// Method and path of this operation for a given task id.
    pub fn route(&self, id: Option<&TaskId>) -> Route {
        let id = id.map(TaskId::as_str).unwrap_or_default();
        match self {
            RemoteOp::List => Route::new("GET", "/api/tasks".to_string()),
            RemoteOp::Create => Route::new("POST", "/api/tasks".to_string()),
            RemoteOp::Toggle => Route::new("PATCH", format!("/api/tasks/{}/status", id)),
            RemoteOp::Update => Route::new("PATCH", format!("/api/tasks/{}", id)),
            RemoteOp::Delete => Route::new("DELETE", format!("/api/tasks/{}", id)),
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOp::List => write!(f, "list"),
            RemoteOp::Create => write!(f, "create"),
            RemoteOp::Toggle => write!(f, "toggle"),
            RemoteOp::Update => write!(f, "update"),
            RemoteOp::Delete => write!(f, "delete"),
        }
    }
}

/// HTTP method and path of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: &'static str,
    pub path: String,
}

impl Route {
    fn new(method: &'static str, path: String) -> Self {
        Route { method, path }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Body of a create request. New tasks always start incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl From<NewTask> for CreateTaskRequest {
    fn from(draft: NewTask) -> Self {
        CreateTaskRequest {
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: false,
        }
    }
}

/// Body of an update request, built from the full edited task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Task> for UpdateTaskRequest {
    fn from(task: &Task) -> Self {
        UpdateTaskRequest {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            created_at: task.created_at,
            due_date: task.due_date,
        }
    }
}

impl UpdateTaskRequest {
    /// Apply this request to a stored task, keeping id and completion.
    pub fn apply_to(&self, task: &Task) -> Task {
        Task {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            created_at: self.created_at,
            due_date: self.due_date,
            ..task.clone()
        }
    }
}

/// Abstract trait for the remote task source.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` so the store can be shared with a
/// background refresh task.
///
/// ## Cancellation
///
/// Once called, an operation runs to completion; the store never drops an
/// in-flight call.
#[async_trait]
pub trait TaskRemote: Send + Sync {
    /// `GET /api/tasks`
    async fn list(&self) -> anyhow::Result<Vec<Task>>;

    /// `POST /api/tasks`
    async fn create(&self, request: CreateTaskRequest) -> anyhow::Result<Task>;

    /// `PATCH /api/tasks/{id}/status`, flipping the completion flag
    async fn toggle_status(&self, id: &TaskId) -> anyhow::Result<Task>;

    /// `PATCH /api/tasks/{id}`
    async fn update(&self, id: &TaskId, request: UpdateTaskRequest) -> anyhow::Result<Task>;

    /// `DELETE /api/tasks/{id}`
    async fn delete(&self, id: &TaskId) -> anyhow::Result<()>;

    /// Get the remote name (e.g., "memory", "file")
    fn name(&self) -> &'static str;
}

#[derive(Default)]
struct MemoryState {
    tasks: Vec<Task>,
    next_id: u64,
    failing: HashSet<RemoteOp>,
    fail_next: HashSet<RemoteOp>,
    calls: HashMap<RemoteOp, usize>,
}

/// In-process remote with failure injection and call counting.
///
/// Used by tests and for wiring the store without a transport. An optional
/// latency makes each call wait on the tokio timer, so in-flight states can
/// be observed under paused time.
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl MemoryRemote {
    /// Create an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a remote pre-populated with tasks.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let remote = Self::new();
        {
            let mut state = remote.state.lock();
            state.next_id = tasks.len() as u64;
            state.tasks = tasks;
        }
        remote
    }

    /// Delay every call by this much.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every call of this operation fail until `recover` is called.
    pub fn fail(&self, op: RemoteOp) {
        self.state.lock().failing.insert(op);
    }

    /// Stop failing this operation.
    pub fn recover(&self, op: RemoteOp) {
        let mut state = self.state.lock();
        state.failing.remove(&op);
        state.fail_next.remove(&op);
    }

    /// Make only the next call of this operation fail.
    pub fn fail_next(&self, op: RemoteOp) {
        self.state.lock().fail_next.insert(op);
    }

    /// Number of calls made to this operation.
    pub fn calls(&self, op: RemoteOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of the tasks held by the remote.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Replace the remote's tasks, as another client would.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.state.lock().tasks = tasks;
    }

    async fn begin(&self, op: RemoteOp, id: Option<&TaskId>) -> anyhow::Result<()> {
        let should_fail = {
            let mut state = self.state.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            state.fail_next.remove(&op) || state.failing.contains(&op)
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if should_fail {
            anyhow::bail!("{}: injected failure", op.route(id));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRemote for MemoryRemote {
    async fn list(&self) -> anyhow::Result<Vec<Task>> {
        self.begin(RemoteOp::List, None).await?;
        Ok(self.tasks())
    }

    async fn create(&self, request: CreateTaskRequest) -> anyhow::Result<Task> {
        self.begin(RemoteOp::Create, None).await?;

        let mut state = self.state.lock();
        state.next_id += 1;
        let task = Task {
            id: TaskId::new(state.next_id.to_string()),
            title: request.title,
            description: request.description,
            completed: request.completed,
            priority: request.priority,
            created_at: Utc::now(),
            due_date: request.due_date,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn toggle_status(&self, id: &TaskId) -> anyhow::Result<Task> {
        self.begin(RemoteOp::Toggle, Some(id)).await?;

        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| anyhow::anyhow!("{}: 404 not found", RemoteOp::Toggle.route(Some(id))))?;
        task.completed = !task.completed;
        Ok(task.clone())
    }

    async fn update(&self, id: &TaskId, request: UpdateTaskRequest) -> anyhow::Result<Task> {
        self.begin(RemoteOp::Update, Some(id)).await?;

        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| anyhow::anyhow!("{}: 404 not found", RemoteOp::Update.route(Some(id))))?;
        *task = request.apply_to(task);
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> anyhow::Result<()> {
        self.begin(RemoteOp::Delete, Some(id)).await?;

        let mut state = self.state.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            anyhow::bail!("{}: 404 not found", RemoteOp::Delete.route(Some(id)));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        let id = TaskId::new("42");
        assert_eq!(RemoteOp::List.route(None).to_string(), "GET /api/tasks");
        assert_eq!(RemoteOp::Create.route(None).to_string(), "POST /api/tasks");
        assert_eq!(
            RemoteOp::Toggle.route(Some(&id)).to_string(),
            "PATCH /api/tasks/42/status"
        );
        assert_eq!(RemoteOp::Update.route(Some(&id)).to_string(), "PATCH /api/tasks/42");
        assert_eq!(RemoteOp::Delete.route(Some(&id)).to_string(), "DELETE /api/tasks/42");
    }

    #[test]
    fn test_create_request_body() {
        let request = CreateTaskRequest::from(NewTask::new("Buy milk").with_priority(2));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["priority"], 2);
        assert_eq!(json["completed"], false);
        assert!(json["description"].is_null());
        assert!(json.get("dueDate").is_none());
    }

    #[test]
    fn test_update_request_keeps_created_at() {
        let task = Task::new("1", "Write report").with_description("Q3");
        let request = UpdateTaskRequest::from(&task);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["title"], "Write report");
        assert_eq!(json["description"], "Q3");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("completed").is_none());
    }

    #[tokio::test]
    async fn test_memory_remote_crud() {
        let remote = MemoryRemote::with_tasks(vec![Task::new("1", "Write report")]);

        let created = remote
            .create(NewTask::new("Buy milk").into())
            .await
            .unwrap();
        assert_eq!(created.id.as_str(), "2");
        assert!(!created.completed);

        let toggled = remote.toggle_status(&created.id).await.unwrap();
        assert!(toggled.completed);

        remote.delete(&TaskId::new("1")).await.unwrap();
        assert!(remote.delete(&TaskId::new("1")).await.is_err());

        assert_eq!(remote.list().await.unwrap().len(), 1);
        assert_eq!(remote.calls(RemoteOp::Delete), 2);
    }

    #[tokio::test]
    async fn test_memory_remote_failure_injection() {
        let remote = MemoryRemote::new();

        remote.fail_next(RemoteOp::List);
        let err = remote.list().await.unwrap_err();
        assert!(err.to_string().contains("GET /api/tasks"));
        assert!(remote.list().await.is_ok());

        remote.fail(RemoteOp::List);
        assert!(remote.list().await.is_err());
        assert!(remote.list().await.is_err());
        remote.recover(RemoteOp::List);
        assert!(remote.list().await.is_ok());
        assert_eq!(remote.calls(RemoteOp::List), 5);
    }
}
