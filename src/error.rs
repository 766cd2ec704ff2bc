use thiserror::Error;

use crate::codec::CodecError;
use crate::reference::DocumentReference;
use crate::remote::StoreError;

/// Errors surfaced to callers of fetch, batch and subscription operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The read succeeded at the transport level, but the document did not
    /// exist or could not be decoded into the target model.
    #[error("invalid data: document is missing or could not be decoded")]
    InvalidData,
    /// Transport error passed through unchanged from the remote store.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Encoding or one-shot decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A save or update was staged for a document without decoded data.
    #[error("document {reference} has no data to write")]
    MissingData { reference: DocumentReference },
}

impl DocumentError {
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, DocumentError::InvalidData)
    }
}
