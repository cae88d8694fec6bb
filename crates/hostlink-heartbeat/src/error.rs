use hostlink_protocol::ProtocolError;

/// Errors that can occur while exchanging one heartbeat.
///
/// None of these stop the loop. The next tick is the retry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never got a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The agent answered with a non-success status.
    #[error("agent returned status {0}")]
    Status(u16),

    /// The request couldn't be serialized.
    #[error("cannot encode heartbeat: {0}")]
    Encode(#[source] ProtocolError),

    /// The response body isn't a heartbeat response.
    #[error("cannot decode heartbeat response: {0}")]
    Decode(#[source] ProtocolError),
}
