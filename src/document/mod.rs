//! Documents - identity-bound wrappers around typed models.
//!
//! A [`Document`] couples a [`DocumentReference`](crate::DocumentReference)
//! with an optional decoded model, the reserved creation/update timestamps
//! and the last raw snapshot it was decoded from.
//!
//! Read paths hand out [`DocumentHandle`]s: shared handles to the canonical
//! instance held by the [`Store`](crate::Store). Newer snapshots are written
//! into that instance in place, so every holder of a handle observes them.

mod document;
mod handle;

pub use document::Document;
pub use handle::DocumentHandle;
