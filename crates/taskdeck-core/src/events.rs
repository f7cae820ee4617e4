//! Change notifications pushed by the store.
//!
//! Observers register a `ChangeHandler` with the store and are called after
//! every collection change (once the search index has been rebuilt) and after
//! every loading/error status change. Handlers are called synchronously and
//! must not block; the channel-based handler forwards events to a receiver
//! that the presentation layer drains at its own pace.

use crate::store::StoreStatus;
use crate::types::TaskId;
use std::fmt;

/// The kind of change that occurred to the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The whole collection was replaced by a fetch
    Replaced,

    /// A task was added
    Inserted,

    /// A task was replaced by a new copy (server confirmation or edit)
    Updated,

    /// A task was removed
    Removed,

    /// An optimistic change was applied ahead of confirmation
    Optimistic,

    /// An optimistic change was reverted after a failed confirmation
    RolledBack,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Replaced => write!(f, "replaced"),
            ChangeKind::Inserted => write!(f, "inserted"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Removed => write!(f, "removed"),
            ChangeKind::Optimistic => write!(f, "optimistic"),
            ChangeKind::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// A collection change event
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The kind of change
    pub kind: ChangeKind,

    /// Affected task (None for whole-collection changes)
    pub id: Option<TaskId>,

    /// Collection generation after the change
    pub generation: u64,
}

impl ChangeEvent {
    /// Create a whole-collection event
    pub fn replaced(generation: u64) -> Self {
        ChangeEvent {
            kind: ChangeKind::Replaced,
            id: None,
            generation,
        }
    }

    /// Create an event for a single task
    pub fn task(kind: ChangeKind, id: TaskId, generation: u64) -> Self {
        ChangeEvent {
            kind,
            id: Some(id),
            generation,
        }
    }
}

/// Handler for store notifications.
pub trait ChangeHandler: Send + Sync {
    /// Called after the collection changed and the index was rebuilt
    fn on_change(&self, event: ChangeEvent);

    /// Called when `is_loading` or `error` changes
    fn on_status(&self, status: StoreStatus);
}

/// Messages sent by the channel handler
#[derive(Debug, Clone)]
pub enum ChangeHandlerMessage {
    /// A collection change
    Change(ChangeEvent),
    /// A loading/error status change
    Status(StoreStatus),
}

/// A channel-based change handler implementation
pub struct ChannelChangeHandler {
    sender: crossbeam_channel::Sender<ChangeHandlerMessage>,
}

impl ChannelChangeHandler {
    /// Create a new channel-based handler
    pub fn new() -> (Self, crossbeam_channel::Receiver<ChangeHandlerMessage>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelChangeHandler { sender }, receiver)
    }
}

impl ChangeHandler for ChannelChangeHandler {
    fn on_change(&self, event: ChangeEvent) {
        let _ = self.sender.send(ChangeHandlerMessage::Change(event));
    }

    fn on_status(&self, status: StoreStatus) {
        let _ = self.sender.send(ChangeHandlerMessage::Status(status));
    }
}
