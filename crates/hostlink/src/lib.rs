//! # Hostlink
//!
//! Game server agent for hosted multiplayer servers.
//!
//! A game server embeds a [`GameServerAgent`] and talks only to it. The
//! agent reports the server's state to the local orchestration agent once
//! a second, applies whatever the agent answers (allocate, shut down,
//! maintenance notices), and hands the server its session data.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostlink::prelude::*;
//!
//! # async fn run() -> Result<(), AgentError> {
//! let agent = GameServerAgent::new();
//! agent.register_health_callback(|| true);
//! agent.register_shutdown_callback(|| tracing::info!("shutting down"));
//!
//! if agent.ready_for_players().await? {
//!     let players = agent.initial_players()?;
//!     // run the match
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! | Crate | Role |
//! |-------|------|
//! | `hostlink-protocol` | Heartbeat wire types |
//! | `hostlink-config` | Startup config file and config map |
//! | `hostlink-lifecycle` | State machine, activation signal, handlers |
//! | `hostlink-heartbeat` | Transport and heartbeat loop |

mod agent;
mod error;
pub mod logging;

pub use agent::{AgentBuilder, GameServerAgent};
pub use error::AgentError;

pub use hostlink_config::{
    AgentConfig, ConfigError, ConfigMap, EnvSource, GamePort,
    GameServerConnectionInfo, ProcessEnv, keys,
};
pub use hostlink_heartbeat::{HeartbeatTransport, HttpTransport, TransportError};
pub use hostlink_lifecycle::LifecycleError;
pub use hostlink_protocol::{
    AgentInfo, ConnectedPlayer, GameHealth, GameState, HeartbeatRequest,
    HeartbeatResponse, MaintenanceEvent, MaintenanceSchedule, Operation,
    SessionConfig,
};

pub mod prelude {
    pub use crate::{
        AgentBuilder, AgentError, ConnectedPlayer, GameServerAgent, GameState,
        MaintenanceSchedule, keys,
    };
}
