use std::future::Future;

use hostlink_protocol::{AgentInfo, HeartbeatRequest, HeartbeatResponse};

use crate::TransportError;

/// Carries heartbeats to the agent.
///
/// Methods return `Send` futures so the loop can run on any runtime
/// worker. Implementations may be written with plain `async fn`.
pub trait HeartbeatTransport: Send + Sync + 'static {
    /// Performs one request/response exchange.
    fn send_heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> impl Future<Output = Result<HeartbeatResponse, TransportError>> + Send;

    /// Announces this agent's flavor and version. Sent once, before the
    /// first heartbeat.
    fn send_info(
        &self,
        info: &AgentInfo,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
