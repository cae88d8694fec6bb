//! Wire protocol for Hostlink.
//!
//! This crate defines the "language" spoken between a game server process
//! and the local orchestration agent:
//!
//! - **Types** ([`HeartbeatRequest`], [`HeartbeatResponse`], [`GameState`],
//!   [`Operation`], etc.): the JSON documents exchanged on every heartbeat.
//! - **Codec** ([`encode`], [`decode`]): how those documents are converted
//!   to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer doesn't know about HTTP or about the lifecycle state
//! machine. It only knows the shape of the messages.
//!
//! ```text
//! Heartbeat (HTTP) → Protocol (HeartbeatResponse) → Lifecycle (transition)
//! ```

mod codec;
mod error;
mod nullable;
mod types;

pub use codec::{decode, encode};
pub use error::ProtocolError;
pub use types::{
    AgentInfo, ConnectedPlayer, GameHealth, GameState, HeartbeatRequest,
    HeartbeatResponse, MaintenanceEvent, MaintenanceSchedule, Operation,
    SessionConfig,
};
