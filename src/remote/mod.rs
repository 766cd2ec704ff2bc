//! Remote document store - the collaborator this crate orchestrates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           Client (fetch / batch / listen)                │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   RemoteStore trait                      │
//! │  get_document(source) / commit(writes) /                 │
//! │  add_snapshot_listener(include_metadata_changes)         │
//! └──────────────────────────────────────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//! ┌─────────────────────┐           ┌──────────────────────┐
//! │ InMemoryRemoteStore │           │  network-backed SDK  │
//! │     (included)      │           │      (external)      │
//! └─────────────────────┘           └──────────────────────┘
//! ```
//!
//! Every operation is asynchronous: results are delivered through the
//! supplied callback, possibly after the call has returned and possibly on
//! another thread.

mod in_memory;
mod store;

pub use in_memory::{InMemoryRegistration, InMemoryRemoteStore};
pub use store::{
    CommitCallback, GetCallback, ListenerRegistration, RemoteStore, SnapshotCallback, Source,
    StoreError, Write, WriteOp,
};
