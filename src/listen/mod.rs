//! Listen - live subscriptions to a single document.
//!
//! Every notification goes through the same decode step as a fetch: a
//! decoded document updates the process-wide store and reaches the
//! completion, a missing or undecodable one arrives as
//! [`DocumentError::InvalidData`], and transport errors pass through.
//! Notifications are delivered in the order the remote store emits them.
//!
//! The returned [`Disposer`] ends the subscription. Once disposed, no
//! further completions start.

mod disposer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use disposer::Disposer;

use crate::client::Documents;
use crate::codec::Codec;
use crate::document::DocumentHandle;
use crate::error::DocumentError;
use crate::fetch::settle;
use crate::model::Model;
use crate::payload::Snapshot;
use crate::reference::DocumentReference;
use crate::remote::{RemoteStore, StoreError};

impl<'a, R: RemoteStore, C: Codec, M: Model> Documents<'a, R, C, M> {
    /// Subscribe to the document with `id` in `M`'s default collection.
    pub fn listen<F>(
        &self,
        id: impl Into<String>,
        include_metadata_changes: bool,
        completion: F,
    ) -> Disposer
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        let reference = self.collection().document(id);
        self.listen_to(&reference, include_metadata_changes, completion)
    }

    /// [`listen`](Self::listen) with the configured metadata-changes default.
    pub fn subscribe<F>(&self, id: impl Into<String>, completion: F) -> Disposer
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        self.listen(id, self.client.config.include_metadata_changes, completion)
    }

    /// Subscribe to the document at `reference`.
    pub fn listen_to<F>(
        &self,
        reference: &DocumentReference,
        include_metadata_changes: bool,
        mut completion: F,
    ) -> Disposer
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        let disposed = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&disposed);
        let store = self.client.store.clone();
        let codec = Arc::clone(&self.client.codec);

        tracing::debug!(%reference, include_metadata_changes, "opening subscription");
        let registration = self.client.remote.add_snapshot_listener(
            reference,
            include_metadata_changes,
            Box::new(move |result: Result<Snapshot, StoreError>| {
                if gate.load(Ordering::SeqCst) {
                    return;
                }
                completion(settle::<M, C>(&store, codec.as_ref(), result));
            }),
        );

        Disposer::with_gate(registration, disposed, Some(reference.clone()))
    }
}
