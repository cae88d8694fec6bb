//! Integration tests for loading the startup config from disk.

use std::collections::HashMap;
use std::io::Write;

use hostlink_config::keys::{CONFIG_FILE_ENV_VAR, LOG_FOLDER, SERVER_ID};
use hostlink_config::{AgentConfig, ConfigError};

// =========================================================================
// Helpers
// =========================================================================

const SAMPLE: &str = r#"{
    "heartbeatEndpoint": "localhost:56005",
    "sessionHostId": "test-host",
    "vmId": "test-vm",
    "logFolder": "/tmp",
    "certificateFolder": "./certs",
    "sharedContentFolder": "./shared",
    "gameCertificates": { "game": "cert" },
    "buildMetadata": { "k": "v" },
    "gamePorts": { "game": 8080 },
    "IpV4Address": "127.0.0.1",
    "fullyQualifiedDomainName": "test.domain.com",
    "gameServerConnectionInfo": {
        "IpV4Address": "127.0.0.1",
        "gamePortsConfiguration": [
            { "name": "game", "serverListeningPort": 8080, "clientConnectionPort": 56100 }
        ]
    }
}"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn env_pointing_at(path: &std::path::Path) -> HashMap<String, String> {
    HashMap::from([(
        CONFIG_FILE_ENV_VAR.to_string(),
        path.display().to_string(),
    )])
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn test_from_env_loads_file() {
    let file = write_config(SAMPLE);
    let config = AgentConfig::from_env(&env_pointing_at(file.path())).unwrap();

    assert_eq!(config.heartbeat_endpoint, "localhost:56005");
    assert_eq!(config.session_host_id, "test-host");
    assert_eq!(config.game_ports["game"], 8080);
    assert_eq!(
        config.game_server_connection_info.game_ports_configuration[0]
            .client_connection_port,
        56100
    );

    let map = config.to_config_map(&HashMap::new());
    assert_eq!(map[SERVER_ID], "test-host");
    assert_eq!(map[LOG_FOLDER], "/tmp");
    assert_eq!(map["k"], "v");
}

#[test]
fn test_missing_env_var() {
    let err = AgentConfig::from_env(&HashMap::new()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(CONFIG_FILE_ENV_VAR)));
    assert!(err.to_string().contains("GSDK_CONFIG_FILE"));
}

#[test]
fn test_blank_env_var_counts_as_missing() {
    let env = HashMap::from([(CONFIG_FILE_ENV_VAR.to_string(), "  ".to_string())]);
    let err = AgentConfig::from_env(&env).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(_)));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");
    let err = AgentConfig::from_env(&env_pointing_at(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_malformed_file() {
    let file = write_config("{ this is not json");
    let err = AgentConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_file_without_endpoint_is_rejected() {
    let file = write_config(r#"{ "sessionHostId": "h" }"#);
    let err = AgentConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField("heartbeatEndpoint")));
}

#[test]
fn test_null_sections_load_as_empty() {
    let file = write_config(
        r#"{
            "heartbeatEndpoint": "localhost:56005",
            "sessionHostId": "test-host",
            "vmId": null,
            "logFolder": null,
            "gameCertificates": null,
            "buildMetadata": null,
            "gamePorts": null,
            "gameServerConnectionInfo": {
                "IpV4Address": null,
                "gamePortsConfiguration": null
            }
        }"#,
    );
    let config = AgentConfig::from_file(file.path()).unwrap();

    assert!(config.build_metadata.is_empty());
    assert!(config.game_certificates.is_empty());
    assert!(config.game_ports.is_empty());
    assert!(config.log_folder.is_empty());
    assert!(config.game_server_connection_info.game_ports_configuration.is_empty());

    let map = config.to_config_map(&HashMap::new());
    assert_eq!(map[SERVER_ID], "test-host");
    assert_eq!(map[LOG_FOLDER], "");
}

#[test]
fn test_null_connection_info_loads_as_default() {
    let file = write_config(
        r#"{
            "heartbeatEndpoint": "localhost:56005",
            "sessionHostId": "test-host",
            "gameServerConnectionInfo": null
        }"#,
    );
    let config = AgentConfig::from_file(file.path()).unwrap();
    assert_eq!(config.game_server_connection_info, Default::default());
}
