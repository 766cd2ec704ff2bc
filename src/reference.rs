//! Document identity.
//!
//! A [`DocumentReference`] is the `(collection path, id)` pair that locates a
//! document in the remote store. It carries no logic and is used as the
//! cache key in [`Store`](crate::Store).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Model;

/// Location of a single document: collection path plus document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentReference {
    collection_path: String,
    id: String,
}

impl DocumentReference {
    pub fn new(collection_path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection_path: collection_path.into(),
            id: id.into(),
        }
    }

    /// Reference into the default collection of `M`.
    pub fn of<M: Model>(id: impl Into<String>) -> Self {
        Self::new(M::COLLECTION, id)
    }

    pub fn collection_path(&self) -> &str {
        &self.collection_path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full slash-separated path, e.g. `users/u1`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection_path, self.id)
    }

    pub fn parent(&self) -> CollectionReference {
        CollectionReference::new(self.collection_path.clone())
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection_path, self.id)
    }
}

/// A collection path from which document references are minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionReference {
    path: String,
}

impl CollectionReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The default collection of `M`.
    pub fn of<M: Model>() -> Self {
        Self::new(M::COLLECTION)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reference to the document with the given id in this collection.
    pub fn document(&self, id: impl Into<String>) -> DocumentReference {
        DocumentReference::new(self.path.clone(), id)
    }

    /// Reference to a new document with a generated id.
    pub fn new_document(&self) -> DocumentReference {
        self.document(auto_id())
    }
}

/// Generate a random document id.
pub fn auto_id() -> String {
    Uuid::new_v4().simple().to_string()
}
