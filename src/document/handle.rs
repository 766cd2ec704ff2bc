use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Document;
use crate::model::Model;
use crate::payload::Timestamp;
use crate::reference::DocumentReference;

/// Shared handle to one document instance.
///
/// Cloning the handle clones the pointer, not the document: every clone
/// reads and writes the same instance.
pub struct DocumentHandle<M> {
    inner: Arc<RwLock<Document<M>>>,
}

impl<M> Clone for DocumentHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Model> From<Document<M>> for DocumentHandle<M> {
    fn from(document: Document<M>) -> Self {
        Self::new(document)
    }
}

impl<M: Model> DocumentHandle<M> {
    pub fn new(document: Document<M>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(document)),
        }
    }

    pub(crate) fn from_shared(inner: Arc<RwLock<Document<M>>>) -> Self {
        Self { inner }
    }

    pub(crate) fn shared(&self) -> Arc<RwLock<Document<M>>> {
        Arc::clone(&self.inner)
    }

    /// Borrow the document for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Document<M>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrow the document for in-place mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, Document<M>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reference(&self) -> DocumentReference {
        self.read().reference().clone()
    }

    /// A copy of the current model data.
    pub fn data(&self) -> Option<M> {
        self.read().data().cloned()
    }

    pub fn created_at(&self) -> Timestamp {
        self.read().created_at()
    }

    pub fn updated_at(&self) -> Timestamp {
        self.read().updated_at()
    }

    /// Apply `f` to the model data in place. Returns `None` without data.
    pub fn modify<R>(&self, f: impl FnOnce(&mut M) -> R) -> Option<R> {
        self.write().data_mut().map(f)
    }

    /// Snapshot copy of the whole document.
    pub fn to_document(&self) -> Document<M> {
        self.read().clone()
    }

    /// True when both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<M: Model + fmt::Debug> fmt::Debug for DocumentHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentHandle").field(&*self.read()).finish()
    }
}
