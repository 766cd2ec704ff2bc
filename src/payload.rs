//! Raw payloads and snapshots as delivered by the remote store.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::reference::DocumentReference;

/// Point in time used for the reserved creation/update fields.
pub type Timestamp = DateTime<Utc>;

/// Generic string-keyed payload of a document.
pub type RawPayload = Map<String, Value>;

/// Reserved payload field holding the creation time.
pub const CREATED_AT: &str = "createdAt";

/// Reserved payload field holding the last update time.
pub const UPDATED_AT: &str = "updatedAt";

/// Metadata the remote store attaches to every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    /// The snapshot was served from the device-persistent cache.
    pub from_cache: bool,
    /// The snapshot contains local writes not yet acknowledged by the server.
    pub has_pending_writes: bool,
}

/// One read of one document. `data` is `None` when the document does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub reference: DocumentReference,
    pub data: Option<RawPayload>,
    pub metadata: SnapshotMetadata,
}

impl Snapshot {
    pub fn new(reference: DocumentReference, data: Option<RawPayload>) -> Self {
        Self {
            reference,
            data,
            metadata: SnapshotMetadata::default(),
        }
    }

    pub fn missing(reference: DocumentReference) -> Self {
        Self::new(reference, None)
    }

    pub fn with_metadata(mut self, metadata: SnapshotMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// Read a timestamp field, falling back to the current time when the field
/// is absent or not a timestamp. Each call captures its own "now".
pub fn timestamp_or_now(payload: &RawPayload, field: &str) -> Timestamp {
    payload
        .get(field)
        .and_then(|value| serde_json::from_value::<Timestamp>(value.clone()).ok())
        .unwrap_or_else(Utc::now)
}

/// Write a timestamp field in its serialized form.
pub fn set_timestamp(payload: &mut RawPayload, field: &str, at: Timestamp) {
    payload.insert(field.to_string(), Value::String(at.to_rfc3339()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn reads_present_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut payload = RawPayload::new();
        set_timestamp(&mut payload, CREATED_AT, at);
        assert_eq!(timestamp_or_now(&payload, CREATED_AT), at);
    }

    #[test]
    fn missing_or_malformed_timestamp_defaults_to_now() {
        let mut payload = RawPayload::new();
        payload.insert(UPDATED_AT.into(), json!(42));

        let before = Utc::now();
        let created = timestamp_or_now(&payload, CREATED_AT);
        let updated = timestamp_or_now(&payload, UPDATED_AT);
        let after = Utc::now();

        assert!(created >= before && created <= after);
        assert!(updated >= before && updated <= after);
        assert!(after - before < Duration::seconds(1));
    }

    #[test]
    fn snapshot_existence() {
        let r = DocumentReference::new("users", "u1");
        assert!(!Snapshot::missing(r.clone()).exists());
        assert!(Snapshot::new(r, Some(RawPayload::new())).exists());
    }
}
