//! Model codec - converts between raw payloads and typed models.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::payload::RawPayload;

/// Error type for codec operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    /// The model did not encode to a key-value map.
    #[error("model must encode to a map, got {0}")]
    NotAnObject(&'static str),
}

/// Capability that turns payloads into models and back.
///
/// Implementations must tolerate missing optional fields on decode.
pub trait Codec: Send + Sync + 'static {
    fn decode<M: DeserializeOwned>(&self, payload: &RawPayload) -> Result<M, CodecError>;

    fn encode<M: Serialize>(&self, model: &M) -> Result<RawPayload, CodecError>;
}

/// Codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode<M: DeserializeOwned>(&self, payload: &RawPayload) -> Result<M, CodecError> {
        serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode<M: Serialize>(&self, model: &M) -> Result<RawPayload, CodecError> {
        match serde_json::to_value(model).map_err(|e| CodecError::Encode(e.to_string()))? {
            Value::Object(map) => Ok(map),
            Value::Null => Err(CodecError::NotAnObject("null")),
            Value::Bool(_) => Err(CodecError::NotAnObject("bool")),
            Value::Number(_) => Err(CodecError::NotAnObject("number")),
            Value::String(_) => Err(CodecError::NotAnObject("string")),
            Value::Array(_) => Err(CodecError::NotAnObject("array")),
        }
    }
}
