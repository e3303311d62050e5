//! Realtime, query-subscribable document store holding clipboard entries.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::entry::{Entry, NewEntry};
use crate::ids::{EntryId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(EntryId),

    #[error("permission denied for document: {0}")]
    PermissionDenied(EntryId),

    #[error("transport error: {0}")]
    Transport(String),
}

/// One delivery on a live query: a full snapshot or a fault.
pub type SnapshotResult = Result<Vec<Entry>, StoreError>;

/// Live query handle. Dropping it cancels the query; the stream ending
/// without a fault means the store closed the query.
pub type SnapshotStream = mpsc::UnboundedReceiver<SnapshotResult>;

#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    /// Live query: entries with `owner_id == owner`, newest first.
    ///
    /// The current result set is delivered immediately, then again after
    /// every change that affects it.
    async fn subscribe(&self, owner: &UserId) -> Result<SnapshotStream, StoreError>;

    /// Create a record with a server-assigned id and timestamp.
    async fn add(&self, entry: NewEntry) -> Result<EntryId, StoreError>;

    /// Delete a record on behalf of `owner`. Records owned by someone else
    /// are rejected, never deleted.
    async fn delete_by_id(&self, owner: &UserId, id: &EntryId) -> Result<(), StoreError>;
}
