//! Error types for the lifecycle layer.

use hostlink_protocol::GameState;

/// Errors returned to callers of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The operation is only valid in `expected`, and the server is in
    /// `actual`. Nothing was changed.
    #[error("game server must be {expected} for this operation, but it is {actual}")]
    InvalidState {
        expected: GameState,
        actual: GameState,
    },
}

/// An attempt to complete the [`ActivationSignal`](crate::ActivationSignal)
/// a second time.
///
/// The state machine only logs these; they never reach the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("activation signal already fired")]
    AlreadyActivated,

    #[error("activation signal already closed")]
    AlreadyClosed,
}
