//! Typed documents over a remote document database.
//!
//! Maps remote documents onto strongly typed models, resolves reads under a
//! [`CachePolicy`] across a process-wide [`Store`], the remote store's
//! device cache and the server, commits atomic [`Batch`]es, and delivers
//! live updates through subscriptions ended by a [`Disposer`].

pub mod batch;
mod client;
mod codec;
mod config;
mod document;
mod error;
pub mod fetch;
pub mod listen;
mod model;
mod payload;
mod reference;
pub mod remote;
mod store;

pub use batch::Batch;
pub use client::{Client, Documents};
pub use codec::{Codec, CodecError, JsonCodec};
pub use config::{ClientConfig, ConfigError};
pub use document::{Document, DocumentHandle};
pub use error::DocumentError;
pub use fetch::CachePolicy;
pub use listen::Disposer;
pub use model::Model;
pub use payload::{
    set_timestamp, timestamp_or_now, RawPayload, Snapshot, SnapshotMetadata, Timestamp,
    CREATED_AT, UPDATED_AT,
};
pub use reference::{auto_id, CollectionReference, DocumentReference};
pub use remote::{
    InMemoryRemoteStore, ListenerRegistration, RemoteStore, Source, StoreError, Write, WriteOp,
};
pub use store::Store;
