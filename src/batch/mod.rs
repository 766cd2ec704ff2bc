//! Batch - stage writes for several documents and commit them atomically.
//!
//! ## Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use typed_docs::{Client, Document, DocumentHandle, InMemoryRemoteStore, Model};
//!
//! #[derive(Serialize, Deserialize, Clone, Default)]
//! struct Session {
//!     user: String,
//! }
//!
//! impl Model for Session {
//!     const COLLECTION: &'static str = "sessions";
//! }
//!
//! let client = Client::new(InMemoryRemoteStore::new());
//! let current = DocumentHandle::new(Document::<Session>::with_id("current"));
//! let stale = DocumentHandle::new(Document::<Session>::with_id("stale"));
//!
//! client
//!     .batch()
//!     .save(&current)
//!     .delete(&stale)
//!     .commit(|result| assert!(result.is_ok()));
//!
//! assert!(client.store().contains(&current.reference()));
//! ```
//!
//! A batch holds at most one intent per reference. Staging another intent
//! for the same reference replaces the earlier one in place: the position
//! of the first intent is kept and the last operation wins.
//!
//! On success the process-wide store is updated for every affected
//! reference: a canonical instance already held for a saved or updated
//! reference takes over the committed contents in place, otherwise the
//! staged handle becomes canonical. Deleted references are removed. On
//! failure the store is left untouched.

use std::sync::Arc;

use chrono::Utc;

use crate::client::{Client, Documents};
use crate::codec::{Codec, JsonCodec};
use crate::document::DocumentHandle;
use crate::error::DocumentError;
use crate::model::Model;
use crate::reference::DocumentReference;
use crate::remote::{RemoteStore, StoreError, Write};
use crate::store::Store;

/// Store mutation to run once the remote commit succeeds.
type Apply = Box<dyn FnOnce(&Store) + Send>;

/// A staged write and its store-side effect (type-erased).
struct Staged {
    write: Write,
    apply: Apply,
}

/// Builder for a single atomic multi-document write.
///
/// `commit` consumes the batch, so a batch can be committed only once.
#[must_use = "a batch does nothing until it is committed"]
pub struct Batch<R, C = JsonCodec> {
    remote: Arc<R>,
    store: Store,
    codec: Arc<C>,
    staged: Vec<Staged>,
    error: Option<DocumentError>,
}

impl<R: RemoteStore, C: Codec> Batch<R, C> {
    pub fn new(client: &Client<R, C>) -> Self {
        Self {
            remote: Arc::clone(&client.remote),
            store: client.store.clone(),
            codec: Arc::clone(&client.codec),
            staged: vec![],
            error: None,
        }
    }

    /// Stage a full create-or-replace of the document.
    pub fn save<M: Model>(self, document: &DocumentHandle<M>) -> Self {
        let now = Utc::now();
        let (reference, payload) = {
            let doc = document.read();
            (
                doc.reference().clone(),
                doc.encode_with(self.codec.as_ref(), Some(doc.created_at()), now),
            )
        };
        match payload {
            Ok(payload) => {
                let handle = document.clone();
                self.stage(
                    Write::save(reference, payload),
                    Box::new(move |store: &Store| {
                        handle.write().set_updated_at(now);
                        store.adopt(&handle);
                    }),
                )
            }
            Err(err) => self.fail(err),
        }
    }

    /// Stage a merge of the document's fields into the stored document.
    pub fn update<M: Model>(self, document: &DocumentHandle<M>) -> Self {
        let now = Utc::now();
        let (reference, payload) = {
            let doc = document.read();
            (
                doc.reference().clone(),
                doc.encode_with(self.codec.as_ref(), None, now),
            )
        };
        match payload {
            Ok(payload) => {
                let handle = document.clone();
                self.stage(
                    Write::update(reference, payload),
                    Box::new(move |store: &Store| {
                        handle.write().set_updated_at(now);
                        store.adopt(&handle);
                    }),
                )
            }
            Err(err) => self.fail(err),
        }
    }

    /// Stage removal of the document.
    pub fn delete<M: Model>(self, document: &DocumentHandle<M>) -> Self {
        self.delete_reference(document.reference())
    }

    /// Stage removal of whatever document lives at `reference`.
    pub fn delete_reference(self, reference: DocumentReference) -> Self {
        let key = reference.clone();
        self.stage(
            Write::delete(reference),
            Box::new(move |store: &Store| {
                store.remove(&key);
            }),
        )
    }

    /// Number of staged intents.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// The staged writes in commit order.
    pub fn writes(&self) -> impl Iterator<Item = &Write> {
        self.staged.iter().map(|s| &s.write)
    }

    /// Commit every staged intent as one atomic write.
    ///
    /// An empty batch completes with `Ok(())` immediately without contacting
    /// the remote store. If staging failed (e.g. a model did not encode) the
    /// completion receives that error and nothing is sent.
    pub fn commit<F>(self, completion: F)
    where
        F: FnOnce(Result<(), DocumentError>) + Send + 'static,
    {
        if let Some(err) = self.error {
            completion(Err(err));
            return;
        }
        if self.staged.is_empty() {
            tracing::debug!("empty batch, nothing to commit");
            completion(Ok(()));
            return;
        }

        let (writes, applies): (Vec<Write>, Vec<Apply>) = self
            .staged
            .into_iter()
            .map(|s| (s.write, s.apply))
            .unzip();
        let count = writes.len();
        let store = self.store;
        tracing::debug!(writes = count, "committing batch");

        self.remote.commit(
            writes,
            Box::new(move |result: Result<(), StoreError>| match result {
                Ok(()) => {
                    for apply in applies {
                        apply(&store);
                    }
                    tracing::debug!(writes = count, "batch committed");
                    completion(Ok(()));
                }
                Err(err) => {
                    tracing::warn!(writes = count, error = %err, "batch commit failed");
                    completion(Err(err.into()));
                }
            }),
        );
    }

    fn stage(mut self, write: Write, apply: Apply) -> Self {
        let staged = Staged { write, apply };
        match self
            .staged
            .iter_mut()
            .find(|s| s.write.reference == staged.write.reference)
        {
            Some(existing) => {
                tracing::debug!(
                    reference = %staged.write.reference,
                    from = ?existing.write.op,
                    to = ?staged.write.op,
                    "superseding staged write"
                );
                *existing = staged;
            }
            None => self.staged.push(staged),
        }
        self
    }

    fn fail(mut self, err: DocumentError) -> Self {
        tracing::warn!(error = %err, "failed to stage write");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }
}

impl<'a, R: RemoteStore, C: Codec, M: Model> Documents<'a, R, C, M> {
    /// Save one document in its own batch.
    pub fn save<F>(&self, document: &DocumentHandle<M>, completion: F)
    where
        F: FnOnce(Result<(), DocumentError>) + Send + 'static,
    {
        self.client.batch().save(document).commit(completion);
    }

    /// Update one document in its own batch.
    pub fn update<F>(&self, document: &DocumentHandle<M>, completion: F)
    where
        F: FnOnce(Result<(), DocumentError>) + Send + 'static,
    {
        self.client.batch().update(document).commit(completion);
    }

    /// Delete one document in its own batch.
    pub fn delete<F>(&self, document: &DocumentHandle<M>, completion: F)
    where
        F: FnOnce(Result<(), DocumentError>) + Send + 'static,
    {
        self.client.batch().delete(document).commit(completion);
    }
}
