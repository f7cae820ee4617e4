//! The task store: fetch gating, mutations and the presented views.
//!
//! `TaskStore` owns the task collection, the search index built from it and
//! the filter state. It is the only writer of the collection. Every write goes
//! through `transact`, which rebuilds the index when the collection changed
//! and notifies registered handlers once the state lock is released.
//!
//! ## Concurrency
//!
//! The store is driven from async code and may be shared between futures (or
//! with a background refresh task through an `Arc`). State sits behind a
//! mutex that is never held across an `.await`; the only suspension points
//! are the debounce wait and the remote call. Operations on the same task id
//! are not serialized: when two overlap, whichever confirmation lands last
//! decides the stored copy.
//!
//! ## Mutation patterns
//!
//! - Create, update and delete are confirm-then-apply: the collection changes
//!   only after the remote succeeds. A failed create is returned to the
//!   caller; failed updates and deletes are only recorded in `error`.
//! - Toggling completion is apply-then-confirm: the flag flips locally first
//!   and is restored if the remote fails.

use crate::collection::TaskCollection;
use crate::config::Config;
use crate::error::{reason, Result, SyncError};
use crate::events::{ChangeEvent, ChangeHandler, ChangeKind};
use crate::filter::compute_view;
use crate::gate::{FreshnessGate, DEFAULT_DEBOUNCE, DEFAULT_FRESHNESS_WINDOW};
use crate::index::{SearchIndex, SearchOptions, SearchResult};
use crate::optimistic::OptimisticChange;
use crate::remote::{TaskRemote, UpdateTaskRequest};
use crate::types::{FilterState, NewTask, StatusFilter, Task, TaskId, TaskPatch};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Shortest interval accepted by `TaskStore::spawn_auto_refresh`.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(1);

/// Timing and search settings for a store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreOptions {
    /// Skip non-forced fetches this soon after a successful one
    pub freshness_window: Duration,

    /// Quiet period collapsing bursts of fetch requests
    pub debounce: Duration,

    /// Search index tuning
    pub search: SearchOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            debounce: DEFAULT_DEBOUNCE,
            search: SearchOptions::default(),
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        StoreOptions {
            freshness_window: config.freshness_window(),
            debounce: config.debounce(),
            search: config.search_options(),
        }
    }
}

/// Loading and error status for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    /// At least one remote operation that shows a spinner is running
    pub is_loading: bool,

    /// Message of the most recent failure, cleared when a new operation starts
    pub error: Option<String>,

    /// When the last successful fetch finished
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// What a call to `request_fetch` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Skipped: the last fetch is inside the freshness window
    Fresh,

    /// Skipped: a later request replaced this one during the debounce wait
    Superseded,

    /// Skipped: another fetch was already running
    InFlight,

    /// The collection was replaced with this many tasks
    Fetched(usize),

    /// The remote read failed; `error` is set
    Failed,
}

struct StoreState {
    collection: TaskCollection,
    index: SearchIndex,
    filter: FilterState,
    gate: FreshnessGate,

    /// Number of running operations that count as loading
    loading: usize,

    error: Option<String>,
}

impl StoreState {
    fn status(&self) -> StoreStatus {
        StoreStatus {
            is_loading: self.loading > 0,
            error: self.error.clone(),
            last_fetched_at: self.gate.last_fetched_at(),
        }
    }

    fn record_error(&mut self, err: &SyncError) {
        self.error = Some(err.user_message().to_string());
    }

    fn begin_loading(&mut self) {
        self.loading += 1;
        self.error = None;
    }

    fn end_loading(&mut self) {
        self.loading = self.loading.saturating_sub(1);
    }
}

/// The client-side task synchronization engine.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use taskdeck_core::{MemoryRemote, NewTask, TaskStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = TaskStore::new(Arc::new(MemoryRemote::new()));
///
/// store.request_fetch(true).await;
/// store.create(NewTask::new("Write report")).await.unwrap();
///
/// store.set_search_query("report");
/// assert_eq!(store.filtered_tasks().len(), 1);
/// # });
/// ```
pub struct TaskStore {
    remote: Arc<dyn TaskRemote>,
    options: StoreOptions,
    state: Mutex<StoreState>,
    handlers: RwLock<Vec<Arc<dyn ChangeHandler>>>,
}

impl TaskStore {
    /// Create an empty store with default options.
    pub fn new(remote: Arc<dyn TaskRemote>) -> Self {
        Self::with_options(remote, StoreOptions::default())
    }

    /// Create an empty store.
    pub fn with_options(remote: Arc<dyn TaskRemote>, options: StoreOptions) -> Self {
        TaskStore {
            remote,
            options,
            state: Mutex::new(StoreState {
                collection: TaskCollection::new(),
                index: SearchIndex::new(options.search),
                filter: FilterState::default(),
                gate: FreshnessGate::new(options.freshness_window),
                loading: 0,
                error: None,
            }),
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Options in effect.
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Register a handler for change and status notifications.
    pub fn subscribe(&self, handler: Arc<dyn ChangeHandler>) {
        self.handlers.write().push(handler);
    }

    /// Run an edit against the state.
    ///
    /// Rebuilds the index if the collection generation moved, then notifies
    /// handlers outside the lock.
    fn transact<R>(&self, edit: impl FnOnce(&mut StoreState, &mut Vec<ChangeEvent>) -> R) -> R {
        let (result, events, status) = {
            let mut state = self.state.lock();
            let generation = state.collection.generation();
            let before = state.status();

            let mut events = Vec::new();
            let result = edit(&mut state, &mut events);

            if state.collection.generation() != generation {
                let StoreState {
                    collection, index, ..
                } = &mut *state;
                index.rebuild(collection);
            }

            let after = state.status();
            (result, events, (after != before).then_some(after))
        };

        if !events.is_empty() || status.is_some() {
            let handlers = self.handlers.read();
            for handler in handlers.iter() {
                for event in &events {
                    handler.on_change(event.clone());
                }
                if let Some(ref status) = status {
                    handler.on_status(status.clone());
                }
            }
        }

        result
    }

    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.lock())
    }

    // === Freshness Gate ===

    /// Fetch the task list from the remote, subject to gating.
    ///
    /// A non-forced request inside the freshness window returns at once.
    /// Otherwise the request waits out the debounce period; a newer request
    /// arriving meanwhile supersedes it. After the wait, the fetch only runs if
    /// no other fetch is in flight. Failures are recorded in `error`, never
    /// returned.
    ///
    /// Only another fetch blocks this one: a running create, update or delete
    /// raises `is_loading` but does not hold the in-flight slot.
    #[instrument(skip(self))]
    pub async fn request_fetch(&self, force: bool) -> FetchOutcome {
        let armed = {
            let mut state = self.state.lock();
            if !force && state.gate.is_fresh(Instant::now()) {
                debug!("Tasks are fresh, skipping fetch");
                return FetchOutcome::Fresh;
            }
            state.gate.arm()
        };

        tokio::select! {
            biased;
            _ = armed.token.cancelled() => {
                debug!(ticket = armed.ticket, "Fetch request superseded");
                return FetchOutcome::Superseded;
            }
            _ = tokio::time::sleep(self.options.debounce) => {}
        }

        let started = self.transact(|state, _| {
            if armed.token.is_cancelled() {
                return Err(FetchOutcome::Superseded);
            }
            state.gate.disarm(armed.ticket);
            if !state.gate.begin_fetch() {
                return Err(FetchOutcome::InFlight);
            }
            state.begin_loading();
            Ok(())
        });
        if let Err(outcome) = started {
            debug!(?outcome, "Fetch not started");
            return outcome;
        }

        let result = self.remote.list().await;

        self.transact(|state, events| {
            state.end_loading();
            match result {
                Ok(tasks) => {
                    let dropped = state.collection.replace_all(tasks);
                    state.gate.finish_fetch(true);
                    events.push(ChangeEvent::replaced(state.collection.generation()));
                    info!(
                        remote = self.remote.name(),
                        tasks = state.collection.len(),
                        dropped,
                        "Tasks fetched"
                    );
                    FetchOutcome::Fetched(state.collection.len())
                }
                Err(err) => {
                    state.gate.finish_fetch(false);
                    let err = SyncError::FetchFailed {
                        reason: reason(&err),
                    };
                    warn!(error = %err, "Fetch failed");
                    state.record_error(&err);
                    FetchOutcome::Failed
                }
            }
        })
    }

    /// Forget the last successful fetch so the next plain request goes out.
    pub fn invalidate(&self) {
        self.transact(|state, _| state.gate.invalidate());
    }

    /// Issue a plain fetch request on a fixed interval.
    ///
    /// The period is raised to at least the debounce (and never below
    /// `MIN_REFRESH_PERIOD`). The task holds only a weak reference and exits
    /// once the store is dropped. Abort the returned handle to stop it earlier.
    pub fn spawn_auto_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let period = period.max(self.options.debounce).max(MIN_REFRESH_PERIOD);
        debug!(period_ms = period.as_millis() as u64, "Starting auto refresh");
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Store dropped, stopping auto refresh");
                    break;
                };
                store.request_fetch(false).await;
            }
        })
    }

    // === Mutation Coordinator ===

    /// Create a task on the remote and add the confirmed copy.
    ///
    /// Failures are recorded in `error` and also returned.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: NewTask) -> Result<Task> {
        self.transact(|state, _| state.begin_loading());

        let result = self.remote.create(draft.into()).await;

        self.transact(|state, events| {
            state.end_loading();
            match result {
                Ok(task) => {
                    let kind = if state.collection.upsert(task.clone()) {
                        ChangeKind::Inserted
                    } else {
                        ChangeKind::Updated
                    };
                    events.push(ChangeEvent::task(
                        kind,
                        task.id.clone(),
                        state.collection.generation(),
                    ));
                    info!(id = %task.id, "Task created");
                    Ok(task)
                }
                Err(err) => {
                    let err = SyncError::CreateFailed {
                        reason: reason(&err),
                    };
                    warn!(error = %err, "Create failed");
                    state.record_error(&err);
                    Err(err)
                }
            }
        })
    }

    /// Edit a task on the remote and store the confirmed copy.
    ///
    /// Returns `NotFound` if the id is not in the collection. Remote failures
    /// are recorded in `error` only.
    #[instrument(skip(self))]
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<()> {
        let request = self.transact(|state, _| {
            let Some(current) = state.collection.get(id) else {
                let err = SyncError::NotFound { id: id.clone() };
                state.record_error(&err);
                return Err(err);
            };
            let request = UpdateTaskRequest::from(&patch.applied_to(current));
            state.begin_loading();
            Ok(request)
        })?;

        let result = self.remote.update(id, request).await;

        self.transact(|state, events| {
            state.end_loading();
            match result {
                Ok(task) => {
                    if state.collection.replace(task) {
                        events.push(ChangeEvent::task(
                            ChangeKind::Updated,
                            id.clone(),
                            state.collection.generation(),
                        ));
                        info!(id = %id, "Task updated");
                    } else {
                        debug!(id = %id, "Task left the collection before update confirmed");
                    }
                }
                Err(err) => {
                    let err = SyncError::UpdateFailed {
                        id: id.clone(),
                        reason: reason(&err),
                    };
                    warn!(error = %err, "Update failed");
                    state.record_error(&err);
                }
            }
        });
        Ok(())
    }

    /// Delete a task on the remote, then drop it locally.
    ///
    /// Returns `NotFound` if the id is not in the collection. Remote failures
    /// are recorded in `error` only.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &TaskId) -> Result<()> {
        self.transact(|state, _| {
            if !state.collection.contains(id) {
                let err = SyncError::NotFound { id: id.clone() };
                state.record_error(&err);
                return Err(err);
            }
            state.begin_loading();
            Ok(())
        })?;

        let result = self.remote.delete(id).await;

        self.transact(|state, events| {
            state.end_loading();
            match result {
                Ok(()) => {
                    if state.collection.remove(id).is_some() {
                        events.push(ChangeEvent::task(
                            ChangeKind::Removed,
                            id.clone(),
                            state.collection.generation(),
                        ));
                    }
                    info!(id = %id, "Task deleted");
                }
                Err(err) => {
                    let err = SyncError::DeleteFailed {
                        id: id.clone(),
                        reason: reason(&err),
                    };
                    warn!(error = %err, "Delete failed");
                    state.record_error(&err);
                }
            }
        });
        Ok(())
    }

    /// Flip a task's completion flag immediately, then confirm remotely.
    ///
    /// A missing id is a no-op. If the remote fails, only the `completed`
    /// field is restored and `error` is set.
    #[instrument(skip(self))]
    pub async fn toggle_completed(&self, id: &TaskId) {
        let change = self.transact(|state, events| {
            let change = OptimisticChange::toggle_completed(state.collection.get(id)?);
            change.apply(&mut state.collection);
            state.error = None;
            events.push(ChangeEvent::task(
                ChangeKind::Optimistic,
                id.clone(),
                state.collection.generation(),
            ));
            Some(change)
        });
        let Some(change) = change else {
            debug!(id = %id, "Toggle on unknown task ignored");
            return;
        };

        let result = self.remote.toggle_status(id).await;

        self.transact(|state, events| match result {
            Ok(task) => {
                if state.collection.replace(task) {
                    events.push(ChangeEvent::task(
                        ChangeKind::Updated,
                        id.clone(),
                        state.collection.generation(),
                    ));
                }
                debug!(id = %id, "Toggle confirmed");
            }
            Err(err) => {
                if change.revert(&mut state.collection) {
                    events.push(ChangeEvent::task(
                        ChangeKind::RolledBack,
                        id.clone(),
                        state.collection.generation(),
                    ));
                }
                let err = SyncError::ToggleFailed {
                    id: id.clone(),
                    reason: reason(&err),
                };
                warn!(error = %err, "Toggle failed, rolled back");
                state.record_error(&err);
            }
        });
    }

    /// Bring a task's completion flag to the given value.
    ///
    /// Does nothing if the task is missing or already has that value.
    pub async fn set_completed(&self, id: &TaskId, completed: bool) {
        let needs_toggle = self.read(|state| {
            state
                .collection
                .get(id)
                .map_or(false, |task| task.completed != completed)
        });
        if needs_toggle {
            self.toggle_completed(id).await;
        }
    }

    // === Views ===

    /// Tasks after search, status and priority filtering.
    pub fn filtered_tasks(&self) -> Vec<Task> {
        self.read(|state| compute_view(&state.collection, &state.index, &state.filter))
    }

    /// Completed tasks, regardless of filter state.
    pub fn completed_tasks(&self) -> Vec<Task> {
        self.read(|state| state.collection.completed())
    }

    /// Tasks still in progress, regardless of filter state.
    pub fn running_tasks(&self) -> Vec<Task> {
        self.read(|state| state.collection.running())
    }

    /// Snapshot of the whole collection in display order.
    pub fn tasks(&self) -> Vec<Task> {
        self.read(|state| state.collection.snapshot())
    }

    /// Get a task by id.
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.read(|state| state.collection.get(id).cloned())
    }

    /// Run a search directly against the index, with scores.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.read(|state| state.index.search(query))
    }

    /// Collection generation (bumped on every change).
    pub fn generation(&self) -> u64 {
        self.read(|state| state.collection.generation())
    }

    /// Number of index rebuilds so far.
    pub fn index_rebuilds(&self) -> u64 {
        self.read(|state| state.index.rebuilds())
    }

    // === Status ===

    pub fn is_loading(&self) -> bool {
        self.read(|state| state.loading > 0)
    }

    pub fn error(&self) -> Option<String> {
        self.read(|state| state.error.clone())
    }

    pub fn status(&self) -> StoreStatus {
        self.read(StoreState::status)
    }

    // === Filter State ===

    pub fn filter_state(&self) -> FilterState {
        self.read(|state| state.filter.clone())
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.transact(|state, _| state.filter.search_query = query);
    }

    pub fn set_status_filter(&self, status: StatusFilter) {
        self.transact(|state, _| state.filter.status_filter = status);
    }

    pub fn set_priority_filter(&self, priority: impl Into<String>) {
        let priority = priority.into();
        self.transact(|state, _| state.filter.priority_filter = priority);
    }

    /// Replace all filter fields at once.
    pub fn set_filter(&self, filter: FilterState) {
        self.transact(|state, _| state.filter = filter);
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TaskStore")
            .field("remote", &self.remote.name())
            .field("tasks", &state.collection.len())
            .field("generation", &state.collection.generation())
            .field("loading", &state.loading)
            .finish()
    }
}
