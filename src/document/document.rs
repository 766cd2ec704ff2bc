use crate::codec::{Codec, CodecError};
use crate::error::DocumentError;
use crate::model::Model;
use crate::payload::{
    set_timestamp, timestamp_or_now, RawPayload, Snapshot, Timestamp, CREATED_AT, UPDATED_AT,
};
use crate::reference::{CollectionReference, DocumentReference};

/// A typed document: identity, optional model data and bookkeeping.
///
/// Invariant: when `data` was produced by decoding, `snapshot` holds the
/// snapshot it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<M> {
    reference: DocumentReference,
    data: Option<M>,
    created_at: Timestamp,
    updated_at: Timestamp,
    snapshot: Option<Snapshot>,
}

impl<M: Model> Default for Document<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Document<M> {
    /// New document with a generated id in `M::COLLECTION` and default data.
    pub fn new() -> Self {
        Self::in_collection(&CollectionReference::of::<M>())
    }

    /// New document with a generated id in the given collection.
    pub fn in_collection(collection: &CollectionReference) -> Self {
        Self::with_data(collection.new_document(), M::default())
    }

    /// Document with an explicit id in `M::COLLECTION` and default data.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::with_data(DocumentReference::of::<M>(id), M::default())
    }

    /// Document with an explicit id in the given collection and default data.
    pub fn with_id_in(id: impl Into<String>, collection: &CollectionReference) -> Self {
        Self::with_data(collection.document(id), M::default())
    }

    /// Document at `reference` holding `data`. Both timestamps are now.
    pub fn with_data(reference: DocumentReference, data: M) -> Self {
        let created_at = chrono::Utc::now();
        let updated_at = chrono::Utc::now();
        Self {
            reference,
            data: Some(data),
            created_at,
            updated_at,
            snapshot: None,
        }
    }

    /// One-shot construction from raw data.
    ///
    /// Fails outright when the payload does not decode; no partial document
    /// is produced. Missing timestamps default to the current time.
    pub fn from_payload<C: Codec>(
        codec: &C,
        id: impl Into<String>,
        payload: &RawPayload,
        collection: Option<&CollectionReference>,
    ) -> Result<Self, CodecError> {
        let reference = match collection {
            Some(collection) => collection.document(id),
            None => DocumentReference::of::<M>(id),
        };
        let data = codec.decode::<M>(payload)?;
        Ok(Self {
            reference,
            data: Some(data),
            created_at: timestamp_or_now(payload, CREATED_AT),
            updated_at: timestamp_or_now(payload, UPDATED_AT),
            snapshot: None,
        })
    }

    /// Build a document from a snapshot, retaining the snapshot.
    ///
    /// A snapshot of a missing document yields a document without data.
    pub fn from_snapshot<C: Codec>(codec: &C, snapshot: Snapshot) -> Result<Self, CodecError> {
        let (data, created_at, updated_at) = match &snapshot.data {
            Some(payload) => (
                Some(codec.decode::<M>(payload)?),
                timestamp_or_now(payload, CREATED_AT),
                timestamp_or_now(payload, UPDATED_AT),
            ),
            None => (None, chrono::Utc::now(), chrono::Utc::now()),
        };
        Ok(Self {
            reference: snapshot.reference.clone(),
            data,
            created_at,
            updated_at,
            snapshot: Some(snapshot),
        })
    }

    /// Decode step shared by every read path.
    ///
    /// A missing document or a payload that fails to decode is reported as
    /// [`DocumentError::InvalidData`]; decode failures are logged.
    pub(crate) fn decode_existing<C: Codec>(
        codec: &C,
        snapshot: Snapshot,
    ) -> Result<Self, DocumentError> {
        if !snapshot.exists() {
            tracing::debug!(reference = %snapshot.reference, "document does not exist");
            return Err(DocumentError::InvalidData);
        }
        let reference = snapshot.reference.clone();
        Self::from_snapshot(codec, snapshot).map_err(|err| {
            tracing::warn!(%reference, error = %err, "failed to decode document");
            DocumentError::InvalidData
        })
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn data(&self) -> Option<&M> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut M> {
        self.data.as_mut()
    }

    pub fn set_data(&mut self, data: M) {
        self.data = Some(data);
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// The last raw snapshot this document was built from, if any.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub(crate) fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    /// Overwrite every mutable field with those of `newer`, keeping this
    /// allocation so existing holders observe the change.
    pub(crate) fn overwrite_with(&mut self, newer: Document<M>) {
        self.data = newer.data;
        self.created_at = newer.created_at;
        self.updated_at = newer.updated_at;
        self.snapshot = newer.snapshot;
    }

    /// Encode the model together with the reserved timestamp fields.
    pub(crate) fn encode_with<C: Codec>(
        &self,
        codec: &C,
        created_at: Option<Timestamp>,
        updated_at: Timestamp,
    ) -> Result<RawPayload, DocumentError> {
        let data = self.data.as_ref().ok_or_else(|| DocumentError::MissingData {
            reference: self.reference.clone(),
        })?;
        let mut payload = codec.encode(data)?;
        if let Some(created_at) = created_at {
            set_timestamp(&mut payload, CREATED_AT, created_at);
        }
        set_timestamp(&mut payload, UPDATED_AT, updated_at);
        Ok(payload)
    }
}
