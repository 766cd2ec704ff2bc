use std::sync::Arc;

use super::CachePolicy;
use crate::client::Documents;
use crate::codec::Codec;
use crate::document::{Document, DocumentHandle};
use crate::error::DocumentError;
use crate::model::Model;
use crate::payload::Snapshot;
use crate::reference::DocumentReference;
use crate::remote::{RemoteStore, StoreError};
use crate::store::Store;

/// Turn one remote result into a canonical document.
///
/// Transport errors pass through; a missing or undecodable document becomes
/// [`DocumentError::InvalidData`]; a decoded document is written into the
/// store and the canonical handle returned.
pub(crate) fn settle<M: Model, C: Codec>(
    store: &Store,
    codec: &C,
    result: Result<Snapshot, StoreError>,
) -> Result<DocumentHandle<M>, DocumentError> {
    let snapshot = result?;
    let document = Document::<M>::decode_existing(codec, snapshot)?;
    Ok(store.upsert(document))
}

impl<'a, R: RemoteStore, C: Codec, M: Model> Documents<'a, R, C, M> {
    /// Resolve `reference` under `policy`.
    ///
    /// Under [`CachePolicy::Default`] and [`CachePolicy::CacheOnly`] the
    /// completion may run twice: first synchronously with the cached
    /// instance, then again once the remote read settles.
    /// [`CachePolicy::NetworkOnly`] runs it exactly once.
    pub fn get<F>(&self, reference: &DocumentReference, policy: CachePolicy, mut completion: F)
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        if policy.consults_store() {
            match self.cached(reference) {
                Some(document) => {
                    tracing::debug!(%reference, ?policy, "process cache hit");
                    completion(Ok(document));
                }
                None => tracing::debug!(%reference, ?policy, "process cache miss"),
            }
        }

        let source = policy.source();
        tracing::debug!(%reference, ?source, "reading document");

        let store = self.client.store.clone();
        let codec = Arc::clone(&self.client.codec);
        self.client.remote.get_document(
            reference,
            source,
            Box::new(move |result: Result<Snapshot, StoreError>| {
                let settled = settle::<M, C>(&store, codec.as_ref(), result);
                if let Err(err) = &settled {
                    tracing::debug!(?source, error = %err, "document read did not resolve");
                }
                completion(settled);
            }),
        );
    }

    /// Resolve a document in `M`'s default collection by id.
    pub fn get_by_id<F>(&self, id: impl Into<String>, policy: CachePolicy, completion: F)
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        let reference = self.collection().document(id);
        self.get(&reference, policy, completion);
    }

    /// [`get`](Self::get) with the configured default policy.
    pub fn fetch<F>(&self, reference: &DocumentReference, completion: F)
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        self.get(reference, self.client.config.default_cache_policy, completion);
    }

    /// [`get_by_id`](Self::get_by_id) with the configured default policy.
    pub fn fetch_by_id<F>(&self, id: impl Into<String>, completion: F)
    where
        F: FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
    {
        self.get_by_id(id, self.client.config.default_cache_policy, completion);
    }

    /// The canonical instance held by the process-wide store, if any.
    /// Never touches the remote store.
    pub fn cached(&self, reference: &DocumentReference) -> Option<DocumentHandle<M>> {
        self.client.store.get::<M>(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    impl Model for Item {
        const COLLECTION: &'static str = "items";
    }

    fn snapshot(value: Option<serde_json::Value>) -> Snapshot {
        Snapshot::new(
            DocumentReference::of::<Item>("i1"),
            value.map(|v| v.as_object().cloned().unwrap()),
        )
    }

    #[test]
    fn settle_passes_transport_errors_through() {
        let store = Store::new();
        let err = settle::<Item, _>(&store, &JsonCodec, Err(StoreError::PermissionDenied("no".into())))
            .unwrap_err();
        assert_eq!(err, DocumentError::Store(StoreError::PermissionDenied("no".into())));
        assert!(store.is_empty());
    }

    #[test]
    fn settle_reports_missing_and_undecodable_as_invalid_data() {
        let store = Store::new();
        assert_eq!(
            settle::<Item, _>(&store, &JsonCodec, Ok(snapshot(None))).unwrap_err(),
            DocumentError::InvalidData
        );
        assert_eq!(
            settle::<Item, _>(&store, &JsonCodec, Ok(snapshot(Some(json!({"name": false})))))
                .unwrap_err(),
            DocumentError::InvalidData
        );
        assert!(store.is_empty());
    }

    #[test]
    fn settle_updates_the_canonical_instance() {
        let store = Store::new();
        let first =
            settle::<Item, _>(&store, &JsonCodec, Ok(snapshot(Some(json!({"name": "a"}))))).unwrap();
        let second =
            settle::<Item, _>(&store, &JsonCodec, Ok(snapshot(Some(json!({"name": "b"}))))).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(first.data().unwrap().name, "b");
    }
}
