//! JSON-over-HTTP transport.

use std::time::Duration;

use hostlink_protocol::{
    AgentInfo, HeartbeatRequest, HeartbeatResponse, decode, encode,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::{HeartbeatTransport, TransportError};

const JSON: &str = "application/json";

/// Talks to the agent over plain HTTP.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    heartbeat_url: String,
    info_url: String,
}

impl HttpTransport {
    /// Upper bound on a single exchange, so a hung agent can't stall
    /// the loop indefinitely.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a transport posting heartbeats to `heartbeat_url` and the
    /// one-time info document to `info_url`.
    ///
    /// # Errors
    /// Returns [`TransportError::Request`] if the HTTP client can't be built.
    pub fn new(
        heartbeat_url: impl Into<String>,
        info_url: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("hostlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            heartbeat_url: heartbeat_url.into(),
            info_url: info_url.into(),
        })
    }

    pub fn heartbeat_url(&self) -> &str {
        &self.heartbeat_url
    }

    pub fn info_url(&self) -> &str {
        &self.info_url
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl HeartbeatTransport for HttpTransport {
    async fn send_heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> Result<HeartbeatResponse, TransportError> {
        let body = encode(request).map_err(TransportError::Encode)?;
        let response = self.post(&self.heartbeat_url, body).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        decode(&bytes).map_err(TransportError::Decode)
    }

    async fn send_info(&self, info: &AgentInfo) -> Result<(), TransportError> {
        let body = encode(info).map_err(TransportError::Encode)?;
        self.post(&self.info_url, body).await.map(|_| ())
    }
}
