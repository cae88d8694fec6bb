//! Error types for configuration loading.

use std::path::PathBuf;

/// Errors that prevent the agent from starting.
///
/// All of these are fatal: there is no degraded mode without a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The environment variable naming the config file is unset or empty.
    #[error("{0} environment variable not set")]
    MissingEnvVar(&'static str),

    /// The config file couldn't be read.
    #[error("cannot read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file isn't valid JSON, or has the wrong shape.
    #[error("cannot parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A field the agent always writes is missing or empty.
    #[error("configuration is missing required field `{0}`")]
    MissingField(&'static str),
}
