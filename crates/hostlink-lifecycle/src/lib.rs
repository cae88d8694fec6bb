//! Game server lifecycle for Hostlink.
//!
//! The agent drives a game server through a small, forward-only state
//! machine. This crate owns that state and everything the heartbeat
//! responses mutate alongside it.
//!
//! # Key types
//!
//! - [`Lifecycle`]: current state, config map, players, and the
//!   transition function fed by heartbeat responses
//! - [`ActivationSignal`]: single-fire "became active" completion that
//!   the readiness wait suspends on
//! - [`CallbackRegistry`]: the game's optional health, maintenance, and
//!   shutdown handlers
//!
//! # How it fits in the stack
//!
//! ```text
//! Façade (above)      ← readiness wait, allocation, accessors
//!     ↕
//! Lifecycle (this crate)  ← state + transition rules
//!     ↕
//! Heartbeat loop      ← feeds responses in, reads requests out
//! ```

mod callbacks;
mod error;
mod machine;
mod signal;

pub use callbacks::CallbackRegistry;
pub use error::{LifecycleError, SignalError};
pub use machine::{Lifecycle, Transition};
pub use signal::{Activation, ActivationSignal};
