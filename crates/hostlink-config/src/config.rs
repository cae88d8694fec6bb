//! The startup configuration record.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::keys::CONFIG_FILE_ENV_VAR;
use crate::{ConfigError, EnvSource};

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Everything the agent tells us about this game server at startup.
///
/// Missing maps and folders deserialize as empty so an older agent that
/// omits a section doesn't stop the server from booting. The two fields
/// needed to heartbeat at all are checked by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// `host:port` of the local agent.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub heartbeat_endpoint: String,
    /// This server's id; part of the heartbeat URL.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub session_host_id: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub vm_id: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub log_folder: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub certificate_folder: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub shared_content_folder: String,
    /// Certificate name → thumbprint.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub game_certificates: HashMap<String, String>,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub build_metadata: HashMap<String, String>,
    /// Port name → port number.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub game_ports: HashMap<String, u16>,
    #[serde(
        rename = "IpV4Address",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub ipv4_address: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub fully_qualified_domain_name: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub game_server_connection_info: GameServerConnectionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_instance_number: Option<u32>,
}

impl AgentConfig {
    /// Loads the config from the file named by `GSDK_CONFIG_FILE`.
    ///
    /// # Errors
    /// - [`ConfigError::MissingEnvVar`]: the variable is unset or blank
    /// - anything [`from_file`](Self::from_file) returns
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let path = env
            .var(CONFIG_FILE_ENV_VAR)
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar(CONFIG_FILE_ENV_VAR))?;
        Self::from_file(path)
    }

    /// Loads and validates the config from a JSON file.
    ///
    /// # Errors
    /// - [`ConfigError::Read`]: the file is missing or unreadable
    /// - [`ConfigError::Parse`]: the contents aren't a config record
    /// - [`ConfigError::MissingField`]: see [`validate`](Self::validate)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks the fields required to reach the agent.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingField`] naming the first empty one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("heartbeatEndpoint"));
        }
        if self.session_host_id.trim().is_empty() {
            return Err(ConfigError::MissingField("sessionHostId"));
        }
        Ok(())
    }

    /// `http://<endpoint>/v1/sessionHosts/<id>/heartbeats`
    pub fn heartbeat_url(&self) -> String {
        format!(
            "http://{}/v1/sessionHosts/{}/heartbeats",
            self.heartbeat_endpoint, self.session_host_id
        )
    }

    /// `http://<endpoint>/v1/metrics/<id>/gsdkinfo`
    pub fn info_url(&self) -> String {
        format!(
            "http://{}/v1/metrics/{}/gsdkinfo",
            self.heartbeat_endpoint, self.session_host_id
        )
    }
}

// ---------------------------------------------------------------------------
// Connection info
// ---------------------------------------------------------------------------

/// How clients reach this server, and which ports it should listen on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameServerConnectionInfo {
    #[serde(
        rename = "IpV4Address",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub ipv4_address: String,
    #[serde(
        rename = "gamePortsConfiguration",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub game_ports_configuration: Vec<GamePort>,
}

/// One named port mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GamePort {
    pub name: String,
    /// The port the game server binds to.
    pub server_listening_port: u16,
    /// The public port clients connect to (maps to `server_listening_port`).
    pub client_connection_port: u16,
}

impl GameServerConnectionInfo {
    /// Finds a port mapping by its configured name.
    pub fn port(&self, name: &str) -> Option<&GamePort> {
        self.game_ports_configuration.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> AgentConfig {
        AgentConfig {
            heartbeat_endpoint: "localhost:56001".into(),
            session_host_id: "host-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_endpoint() {
        let config = AgentConfig {
            heartbeat_endpoint: " ".into(),
            ..minimal()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("heartbeatEndpoint"))
        ));
    }

    #[test]
    fn test_validate_requires_session_host_id() {
        let config = AgentConfig {
            session_host_id: String::new(),
            ..minimal()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("sessionHostId"))
        ));
    }

    #[test]
    fn test_urls() {
        let config = minimal();
        assert_eq!(
            config.heartbeat_url(),
            "http://localhost:56001/v1/sessionHosts/host-1/heartbeats"
        );
        assert_eq!(
            config.info_url(),
            "http://localhost:56001/v1/metrics/host-1/gsdkinfo"
        );
    }

    #[test]
    fn test_wire_field_names() {
        let json = r#"{
            "heartbeatEndpoint": "localhost:1",
            "sessionHostId": "h",
            "IpV4Address": "10.0.0.1",
            "gamePorts": { "game": 7777 },
            "gameServerConnectionInfo": {
                "IpV4Address": "20.0.0.1",
                "gamePortsConfiguration": [
                    { "name": "game", "serverListeningPort": 7777, "clientConnectionPort": 30000 }
                ]
            }
        }"#;
        let config: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.ipv4_address, "10.0.0.1");
        assert_eq!(config.game_ports["game"], 7777);
        let info = &config.game_server_connection_info;
        assert_eq!(info.ipv4_address, "20.0.0.1");
        assert_eq!(info.port("game").unwrap().client_connection_port, 30000);
        assert!(info.port("voice").is_none());
    }
}
