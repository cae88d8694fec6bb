//! Well-known keys in the [`ConfigMap`](crate::ConfigMap).

/// Environment variable holding the path to the startup config file.
pub const CONFIG_FILE_ENV_VAR: &str = "GSDK_CONFIG_FILE";

pub const TITLE_ID_ENV_VAR: &str = "PF_TITLE_ID";
pub const BUILD_ID_ENV_VAR: &str = "PF_BUILD_ID";
pub const REGION_ENV_VAR: &str = "PF_REGION";

pub const SESSION_COOKIE: &str = "sessionCookie";
pub const SESSION_ID: &str = "sessionId";
pub const HEARTBEAT_ENDPOINT: &str = "heartbeatEndpoint";
pub const SERVER_ID: &str = "serverId";
pub const LOG_FOLDER: &str = "logFolder";
pub const SHARED_CONTENT_FOLDER: &str = "sharedContentFolder";
pub const CERTIFICATE_FOLDER: &str = "certificateFolder";
pub const TITLE_ID: &str = "titleId";
pub const BUILD_ID: &str = "buildId";
pub const REGION: &str = "region";
pub const VM_ID: &str = "vmId";
pub const IPV4_ADDRESS: &str = "IpV4Address";
pub const FULLY_QUALIFIED_DOMAIN_NAME: &str = "fullyQualifiedDomainName";
