//! A task remote backed by a JSON file.
//!
//! Every operation reads the whole file, applies the change and writes it
//! back through a temp file that is renamed into place, so a failed write
//! never leaves a truncated task file. Ids are assigned as one more than the
//! largest numeric id present. A missing file reads as an empty task list.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use taskdeck_core::{CreateTaskRequest, RemoteOp, Task, TaskId, TaskRemote, UpdateTaskRequest};
use tokio::sync::Mutex;
use tracing::debug;

/// File-backed remote used by the CLI.
pub struct JsonFileRemote {
    path: PathBuf,

    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileRemote {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRemote {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next write goes to before it replaces the task file.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn load(&self) -> anyhow::Result<Vec<Task>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Task file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        serde_json::from_slice(&contents)
            .with_context(|| format!("Invalid task file {}", self.path.display()))
    }

    async fn store(&self, tasks: &[Task]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temp file, then rename over the task file
        let contents = serde_json::to_vec_pretty(tasks)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, contents)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }

        debug!(path = %self.path.display(), tasks = tasks.len(), "Task file written");
        Ok(())
    }

    /// Load, edit the task with this id, and write back.
    async fn edit(
        &self,
        op: RemoteOp,
        id: &TaskId,
        edit: impl FnOnce(&mut Task),
    ) -> anyhow::Result<Task> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;

        let task = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .with_context(|| format!("{}: 404 not found", op.route(Some(id))))?;
        edit(task);
        let task = task.clone();

        self.store(&tasks).await?;
        Ok(task)
    }
}

fn next_id(tasks: &[Task]) -> TaskId {
    let max = tasks
        .iter()
        .filter_map(|t| t.id.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    TaskId::new((max + 1).to_string())
}

#[async_trait]
impl TaskRemote for JsonFileRemote {
    async fn list(&self) -> anyhow::Result<Vec<Task>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn create(&self, request: CreateTaskRequest) -> anyhow::Result<Task> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;

        let task = Task {
            id: next_id(&tasks),
            title: request.title,
            description: request.description,
            completed: request.completed,
            priority: request.priority,
            created_at: Utc::now(),
            due_date: request.due_date,
        };
        tasks.push(task.clone());

        self.store(&tasks).await?;
        Ok(task)
    }

    async fn toggle_status(&self, id: &TaskId) -> anyhow::Result<Task> {
        self.edit(RemoteOp::Toggle, id, |task| task.completed = !task.completed)
            .await
    }

    async fn update(&self, id: &TaskId, request: UpdateTaskRequest) -> anyhow::Result<Task> {
        self.edit(RemoteOp::Update, id, |task| *task = request.apply_to(task))
            .await
    }

    async fn delete(&self, id: &TaskId) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.load().await?;

        let before = tasks.len();
        tasks.retain(|t| &t.id != id);
        if tasks.len() == before {
            anyhow::bail!("{}: 404 not found", RemoteOp::Delete.route(Some(id)));
        }

        self.store(&tasks).await
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::NewTask;
    use tempfile::TempDir;

    fn remote(dir: &TempDir) -> JsonFileRemote {
        JsonFileRemote::new(dir.path().join("data").join("tasks.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(remote(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_persists_and_assigns_ids() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);

        let a = remote.create(NewTask::new("Write report").into()).await.unwrap();
        let b = remote
            .create(NewTask::new("Buy milk").with_priority(2).into())
            .await
            .unwrap();
        assert_eq!(a.id.as_str(), "1");
        assert_eq!(b.id.as_str(), "2");

        let reopened = JsonFileRemote::new(remote.path());
        let tasks = reopened.list().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].priority, Some(2));
    }

    #[tokio::test]
    async fn test_ids_follow_the_largest_numeric_id() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);
        remote
            .store(&[Task::new("7", "Seven"), Task::new("abc", "Named")])
            .await
            .unwrap();

        let task = remote.create(NewTask::new("Next").into()).await.unwrap();
        assert_eq!(task.id.as_str(), "8");
    }

    #[tokio::test]
    async fn test_toggle_update_delete() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);
        let task = remote.create(NewTask::new("Write report").into()).await.unwrap();

        let toggled = remote.toggle_status(&task.id).await.unwrap();
        assert!(toggled.completed);

        let mut edited = toggled.clone();
        edited.title = "Write final report".to_string();
        let updated = remote
            .update(&task.id, UpdateTaskRequest::from(&edited))
            .await
            .unwrap();
        assert_eq!(updated.title, "Write final report");
        assert!(updated.completed);

        remote.delete(&task.id).await.unwrap();
        assert!(remote.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_id_errors() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);
        let ghost = TaskId::new("9");

        let err = remote.toggle_status(&ghost).await.unwrap_err();
        assert!(err.to_string().contains("PATCH /api/tasks/9/status"));
        assert!(remote.delete(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_writes_replace_the_file_atomically() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);

        let task = remote.create(NewTask::new("Write report").into()).await.unwrap();
        remote.toggle_status(&task.id).await.unwrap();

        let data_dir = remote.path().parent().unwrap();
        let names: Vec<_> = std::fs::read_dir(data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["tasks.json"]);
        assert!(!remote.temp_path().exists());
    }

    #[tokio::test]
    async fn test_leftover_temp_file_does_not_affect_reads() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);
        remote.create(NewTask::new("Write report").into()).await.unwrap();

        // an interrupted write leaves only a partial temp file behind
        std::fs::write(remote.temp_path(), "[{\"id\":").unwrap();

        assert_eq!(remote.list().await.unwrap().len(), 1);
        remote.create(NewTask::new("Buy milk").into()).await.unwrap();
        assert_eq!(remote.list().await.unwrap().len(), 2);
        assert!(!remote.temp_path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let remote = remote(&dir);
        std::fs::create_dir_all(remote.path().parent().unwrap()).unwrap();
        std::fs::write(remote.path(), "not json").unwrap();

        assert!(remote.list().await.is_err());
    }
}
