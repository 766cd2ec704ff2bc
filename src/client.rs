//! Client - binds a remote store, the process-wide store, a codec and
//! configuration into the caller-facing API.
//!
//! ## Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use typed_docs::{CachePolicy, Client, InMemoryRemoteStore, Model};
//!
//! #[derive(Serialize, Deserialize, Clone, Default)]
//! struct User {
//!     name: String,
//! }
//!
//! impl Model for User {
//!     const COLLECTION: &'static str = "users";
//! }
//!
//! let client = Client::new(InMemoryRemoteStore::new());
//! client.documents::<User>().get_by_id("u1", CachePolicy::NetworkOnly, |result| {
//!     assert!(result.is_err());
//! });
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::batch::Batch;
use crate::codec::{Codec, JsonCodec};
use crate::config::ClientConfig;
use crate::model::Model;
use crate::reference::CollectionReference;
use crate::remote::RemoteStore;
use crate::store::Store;

/// Entry point for fetching, writing and subscribing to documents.
///
/// Clones share the remote store, the process-wide store and the codec.
pub struct Client<R, C = JsonCodec> {
    pub(crate) remote: Arc<R>,
    pub(crate) store: Store,
    pub(crate) codec: Arc<C>,
    pub(crate) config: ClientConfig,
}

impl<R, C> Clone for Client<R, C> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            store: self.store.clone(),
            codec: Arc::clone(&self.codec),
            config: self.config.clone(),
        }
    }
}

impl<R: RemoteStore> Client<R, JsonCodec> {
    /// Client with a fresh store, the JSON codec and default configuration.
    pub fn new(remote: R) -> Self {
        Self::with_codec(remote, JsonCodec)
    }
}

impl<R: RemoteStore, C: Codec> Client<R, C> {
    pub fn with_codec(remote: R, codec: C) -> Self {
        Self {
            remote: Arc::new(remote),
            store: Store::new(),
            codec: Arc::new(codec),
            config: ClientConfig::default(),
        }
    }

    /// Use an existing store, e.g. one shared with another client.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Typed access to documents of model `M`.
    pub fn documents<M: Model>(&self) -> Documents<'_, R, C, M> {
        Documents::new(self)
    }

    /// Start an empty atomic batch.
    pub fn batch(&self) -> Batch<R, C> {
        Batch::new(self)
    }
}

/// Typed accessor for documents of one model type.
///
/// Fetch operations live in [`fetch`](crate::fetch), subscriptions in
/// [`listen`](crate::listen) and single-document writes in
/// [`batch`](crate::batch).
pub struct Documents<'a, R, C, M> {
    pub(crate) client: &'a Client<R, C>,
    _marker: PhantomData<M>,
}

impl<'a, R: RemoteStore, C: Codec, M: Model> Documents<'a, R, C, M> {
    pub fn new(client: &'a Client<R, C>) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }

    /// The default collection of `M`.
    pub fn collection(&self) -> CollectionReference {
        CollectionReference::of::<M>()
    }
}
