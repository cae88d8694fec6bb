//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding heartbeat documents.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, wrong data types, or a truncated
    /// response body from the agent.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
