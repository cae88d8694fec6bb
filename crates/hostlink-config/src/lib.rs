//! Startup configuration for Hostlink.
//!
//! The orchestration agent writes a JSON file describing this game server
//! (endpoint, ids, folders, ports, certificates) and points the process at
//! it through the `GSDK_CONFIG_FILE` environment variable. This crate:
//!
//! 1. **Loads** that file into an [`AgentConfig`]
//! 2. **Flattens** it into a string-keyed [`ConfigMap`], adding a few
//!    values that come straight from the environment
//!
//! Environment lookups go through the [`EnvSource`] trait so tests never
//! have to touch the real process environment.

mod config;
mod env;
mod error;
pub mod keys;
mod map;
mod nullable;

pub use config::{AgentConfig, GamePort, GameServerConnectionInfo};
pub use env::{EnvSource, ProcessEnv};
pub use error::ConfigError;
pub use map::ConfigMap;
