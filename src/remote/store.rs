//! Core remote store trait and wire-level types.

use thiserror::Error;

use crate::payload::{RawPayload, Snapshot};
use crate::reference::DocumentReference;

/// Tier a single-document read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Whatever the remote store's own policy picks: server when reachable,
    /// device-persistent cache otherwise.
    Default,
    /// Device-persistent cache only.
    Cache,
    /// Authoritative server only.
    Server,
}

/// Kind of a staged write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    /// Create or replace the whole document.
    Save,
    /// Merge fields into the document.
    Update,
    /// Remove the document.
    Delete,
}

/// One write intent inside an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub reference: DocumentReference,
    pub op: WriteOp,
    /// Encoded payload; `None` for deletes.
    pub payload: Option<RawPayload>,
}

impl Write {
    pub fn save(reference: DocumentReference, payload: RawPayload) -> Self {
        Self {
            reference,
            op: WriteOp::Save,
            payload: Some(payload),
        }
    }

    pub fn update(reference: DocumentReference, payload: RawPayload) -> Self {
        Self {
            reference,
            op: WriteOp::Update,
            payload: Some(payload),
        }
    }

    pub fn delete(reference: DocumentReference) -> Self {
        Self {
            reference,
            op: WriteOp::Delete,
            payload: None,
        }
    }
}

/// Transport-level errors reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested tier could not be reached (offline, cache miss policy).
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The operation was rejected as a whole (e.g. an atomic commit).
    #[error("aborted: {0}")]
    Aborted(String),
    #[error("store error: {0}")]
    Other(String),
}

/// Completion of a single-document read.
pub type GetCallback = Box<dyn FnOnce(Result<Snapshot, StoreError>) + Send>;

/// Completion of an atomic commit.
pub type CommitCallback = Box<dyn FnOnce(Result<(), StoreError>) + Send>;

/// Receiver of live snapshot notifications.
pub type SnapshotCallback = Box<dyn FnMut(Result<Snapshot, StoreError>) + Send>;

/// Handle to a live subscription opened on the remote store.
pub trait ListenerRegistration: Send + Sync {
    /// Stop delivering notifications. Must be safe to call repeatedly.
    fn remove(&self);
}

/// The remote document database, seen through its three read/write paths.
///
/// Implementations might include:
/// - `InMemoryRemoteStore` - For testing and single-process scenarios
/// - an adapter over a vendor SDK
pub trait RemoteStore: Send + Sync + 'static {
    /// Read one document from the given tier.
    ///
    /// A document that does not exist is reported as `Ok` with a snapshot
    /// whose data is `None`.
    fn get_document(&self, reference: &DocumentReference, source: Source, completion: GetCallback);

    /// Apply all writes atomically: either every write is applied or none is.
    fn commit(&self, writes: Vec<Write>, completion: CommitCallback);

    /// Open a live subscription to one document.
    fn add_snapshot_listener(
        &self,
        reference: &DocumentReference,
        include_metadata_changes: bool,
        listener: SnapshotCallback,
    ) -> Box<dyn ListenerRegistration>;
}
