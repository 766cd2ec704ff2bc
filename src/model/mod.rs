//! Models - typed application data mapped onto remote documents.
//!
//! ## Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use typed_docs::Model;
//!
//! #[derive(Serialize, Deserialize, Clone, Default)]
//! struct User {
//!     name: String,
//! }
//!
//! impl Model for User {
//!     const COLLECTION: &'static str = "users";
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored as the data of a document.
///
/// A model is bound to exactly one default collection. Identity lives on the
/// [`Document`](crate::Document) wrapping the model, not on the model itself.
pub trait Model: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// The default collection path for this model type (e.g. "users").
    const COLLECTION: &'static str;
}
