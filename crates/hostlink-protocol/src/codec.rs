//! JSON encoding helpers.
//!
//! The agent only speaks JSON, so unlike a pluggable codec this is a pair
//! of free functions. They exist so every layer maps `serde_json` failures
//! into [`ProtocolError`] the same way.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Serializes a value into a JSON byte buffer.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if the value can't be represented
/// as JSON (e.g. a map with non-string keys).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(ProtocolError::Encode)
}

/// Deserializes a JSON byte buffer.
///
/// # Errors
/// Returns [`ProtocolError::Decode`] if the bytes are malformed or don't
/// match the expected type.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}
