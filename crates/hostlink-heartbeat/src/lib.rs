//! Heartbeat transport and scheduler for Hostlink.
//!
//! Provides the [`HeartbeatTransport`] trait that abstracts how one
//! heartbeat reaches the agent, and the [`HeartbeatLoop`] that decides
//! *when* heartbeats go out.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpTransport`], JSON over HTTP via `reqwest`
//!
//! # Scheduling
//!
//! The loop sits in a `tokio::select!` between two wake-ups:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         _ = lifecycle.heartbeat_requested() => { /* state changed */ }
//!         _ = time::sleep(interval) => { /* steady cadence */ }
//!     }
//!     beat().await;
//! }
//! ```
//!
//! Whichever fires first triggers exactly one heartbeat.

mod error;
#[cfg(feature = "http")]
mod http;
mod scheduler;
mod transport;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use scheduler::{HeartbeatLoop, Wake};
pub use transport::HeartbeatTransport;
