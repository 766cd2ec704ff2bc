//! Store - process-wide cache of canonical document instances.
//!
//! The store maps each [`DocumentReference`] to the one document instance
//! considered canonical for it. Cache hits return a handle to that same
//! instance, never a copy, and newer decodes are written into it in place.
//!
//! There is no eviction: entries live as long as the store does. The store
//! is constructed explicitly and passed around; clones share storage.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::document::{Document, DocumentHandle};
use crate::model::Model;
use crate::reference::DocumentReference;

type Entry = Arc<dyn Any + Send + Sync>;

/// In-memory identity map from reference to canonical document.
///
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct Store {
    entries: Arc<RwLock<HashMap<DocumentReference, Entry>>>,
}

fn canonical<M: Model>(
    entries: &HashMap<DocumentReference, Entry>,
    reference: &DocumentReference,
) -> Option<Arc<RwLock<Document<M>>>> {
    entries
        .get(reference)
        .and_then(|entry| Arc::clone(entry).downcast::<RwLock<Document<M>>>().ok())
}

impl Store {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical instance for `reference`, if one of type `M` is held.
    pub fn get<M: Model>(&self, reference: &DocumentReference) -> Option<DocumentHandle<M>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        canonical::<M>(&entries, reference).map(DocumentHandle::from_shared)
    }

    /// Record a freshly decoded document.
    ///
    /// When a canonical instance of the same type exists, its fields are
    /// overwritten in place and that instance is returned. Otherwise the
    /// document becomes the canonical instance.
    pub fn upsert<M: Model>(&self, document: Document<M>) -> DocumentHandle<M> {
        let reference = document.reference().clone();
        let shared = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match canonical::<M>(&entries, &reference) {
                Some(shared) => shared,
                None => {
                    let handle = DocumentHandle::new(document);
                    entries.insert(reference, handle.shared() as Entry);
                    return handle;
                }
            }
        };

        // The map lock is released before the document lock is taken.
        let handle = DocumentHandle::from_shared(shared);
        handle.write().overwrite_with(document);
        handle
    }

    /// Record a handle whose contents were just committed.
    ///
    /// An existing canonical instance of the same type takes over the
    /// handle's contents in place and is returned; otherwise `handle`
    /// becomes canonical.
    pub fn adopt<M: Model>(&self, handle: &DocumentHandle<M>) -> DocumentHandle<M> {
        let reference = handle.reference();
        let shared = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match canonical::<M>(&entries, &reference) {
                Some(shared) => shared,
                None => {
                    entries.insert(reference, handle.shared() as Entry);
                    return handle.clone();
                }
            }
        };

        let existing = DocumentHandle::from_shared(shared);
        if !existing.ptr_eq(handle) {
            let committed = handle.to_document();
            existing.write().overwrite_with(committed);
        }
        existing
    }

    /// Make `handle` the canonical instance for its reference (last write wins).
    pub fn insert<M: Model>(&self, handle: &DocumentHandle<M>) {
        let reference = handle.reference();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference, handle.shared() as Entry);
    }

    /// Drop the entry for `reference`. Returns true if it existed.
    pub fn remove(&self, reference: &DocumentReference) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reference)
            .is_some()
    }

    pub fn contains(&self, reference: &DocumentReference) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry (useful for test cleanup).
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
