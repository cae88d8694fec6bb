//! Flattening the config record into string key/value pairs.

use std::collections::HashMap;

use crate::keys;
use crate::{AgentConfig, EnvSource};

/// String-keyed view of the configuration.
///
/// Built once at startup, then updated in place by heartbeat responses
/// (session id/cookie, session metadata).
pub type ConfigMap = HashMap<String, String>;

impl AgentConfig {
    /// Builds the [`ConfigMap`].
    ///
    /// Certificates, build metadata, and ports go in first; the well-known
    /// keys are written last, so they win if a build happens to reuse one of
    /// their names. Title, build, and region come from the environment and
    /// are empty when unset.
    pub fn to_config_map(&self, env: &dyn EnvSource) -> ConfigMap {
        let mut map = ConfigMap::new();

        map.extend(self.game_certificates.clone());
        map.extend(self.build_metadata.clone());
        map.extend(
            self.game_ports
                .iter()
                .map(|(name, port)| (name.clone(), port.to_string())),
        );

        let env_or_empty = |key: &str| env.var(key).unwrap_or_default();

        let fixed = [
            (keys::HEARTBEAT_ENDPOINT, self.heartbeat_endpoint.clone()),
            (keys::SERVER_ID, self.session_host_id.clone()),
            (keys::VM_ID, self.vm_id.clone()),
            (keys::LOG_FOLDER, self.log_folder.clone()),
            (keys::SHARED_CONTENT_FOLDER, self.shared_content_folder.clone()),
            (keys::CERTIFICATE_FOLDER, self.certificate_folder.clone()),
            (keys::TITLE_ID, env_or_empty(keys::TITLE_ID_ENV_VAR)),
            (keys::BUILD_ID, env_or_empty(keys::BUILD_ID_ENV_VAR)),
            (keys::REGION, env_or_empty(keys::REGION_ENV_VAR)),
            (keys::IPV4_ADDRESS, self.ipv4_address.clone()),
            (
                keys::FULLY_QUALIFIED_DOMAIN_NAME,
                self.fully_qualified_domain_name.clone(),
            ),
        ];
        for (key, value) in fixed {
            map.insert(key.to_string(), value);
        }

        map
    }
}
