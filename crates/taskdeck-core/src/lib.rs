//! # Taskdeck Core Library
//!
//! This crate provides the client-side synchronization engine for a task
//! list served by a remote collaborator: fetch gating, remote-confirmed and
//! optimistic mutations, fuzzy title search, and filtered views. The
//! transport is abstracted behind the `TaskRemote` trait.
//!
//! ## Architecture
//!
//! - **Types** (`types`): Tasks, drafts, patches and filter state
//! - **Collection** (`collection`): The ordered, id-unique task list
//! - **Index** (`index`): Fuzzy search index rebuilt from the collection
//! - **Filter** (`filter`): Search, status and priority stages of a view
//! - **Gate** (`gate`): Freshness window, debounce and in-flight bookkeeping
//! - **Optimistic** (`optimistic`): Forward/inverse edits for rollback
//! - **Remote** (`remote`): The remote interface and an in-memory remote
//! - **Store** (`store`): The engine tying all of the above together
//! - **Events** (`events`): Change notifications for observers
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskdeck_core::{MemoryRemote, StatusFilter, TaskStore};
//!
//! let store = TaskStore::new(Arc::new(MemoryRemote::new()));
//!
//! // Load tasks, collapsing bursts and skipping fresh data
//! store.request_fetch(false).await;
//!
//! // Narrow the view
//! store.set_search_query("report");
//! store.set_status_filter(StatusFilter::InProgress);
//! for task in store.filtered_tasks() {
//!     println!("{}", task.title);
//! }
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod gate;
pub mod index;
pub mod optimistic;
pub mod remote;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use collection::TaskCollection;
pub use config::Config;
pub use error::{Result, SyncError};
pub use events::{
    ChangeEvent, ChangeHandler, ChangeHandlerMessage, ChangeKind, ChannelChangeHandler,
};
pub use filter::compute_view;
pub use index::{SearchIndex, SearchOptions, SearchResult};
pub use remote::{CreateTaskRequest, MemoryRemote, RemoteOp, TaskRemote, UpdateTaskRequest};
pub use store::{FetchOutcome, StoreOptions, StoreStatus, TaskStore};
pub use types::{FilterState, NewTask, StatusFilter, Task, TaskId, TaskPatch};
