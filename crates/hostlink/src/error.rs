//! Unified error type for the Hostlink agent.

use hostlink_config::ConfigError;
use hostlink_heartbeat::TransportError;
use hostlink_lifecycle::LifecycleError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The startup configuration couldn't be loaded. Fatal: the server
    /// can't be managed without it.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle precondition was violated (e.g. allocating too early).
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The heartbeat client couldn't be created.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Startup needs a Tokio runtime to run the heartbeat loop on.
    #[error("no Tokio runtime available to run the heartbeat loop")]
    NoRuntime,
}
