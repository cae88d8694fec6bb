//! `GameServerAgent` builder and façade.
//!
//! This is the entry point a game server talks to. It ties together all
//! the layers: config → lifecycle → heartbeat loop.
//!
//! Startup is lazy: the first call that needs it loads the config, builds
//! the config map, and spawns the heartbeat loop. Every later call reuses
//! that. Handler registration never triggers startup, so handlers can be
//! installed before the first heartbeat goes out.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hostlink_config::{
    AgentConfig, ConfigMap, EnvSource, GameServerConnectionInfo, ProcessEnv,
    keys,
};
use hostlink_heartbeat::{
    HeartbeatLoop, HeartbeatTransport, HttpTransport, TransportError,
};
use hostlink_lifecycle::{CallbackRegistry, Lifecycle};
use hostlink_protocol::{ConnectedPlayer, GameState, MaintenanceSchedule};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{AgentError, logging};

type Connect<T> = fn(&AgentConfig) -> Result<T, TransportError>;

fn connect_http(config: &AgentConfig) -> Result<HttpTransport, TransportError> {
    HttpTransport::new(config.heartbeat_url(), config.info_url())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`GameServerAgent`].
///
/// # Example
///
/// ```rust,ignore
/// use hostlink::prelude::*;
///
/// let agent = GameServerAgent::builder()
///     .debug_logs(true)
///     .build();
/// agent.register_shutdown_callback(|| println!("bye"));
/// if agent.ready_for_players().await? {
///     // allocated: start the match
/// }
/// ```
pub struct AgentBuilder<T = HttpTransport> {
    config: Option<AgentConfig>,
    env: Arc<dyn EnvSource>,
    transport: Option<T>,
    connect: Connect<T>,
    interval: Duration,
    debug_logs: bool,
    install_logging: bool,
}

impl AgentBuilder<HttpTransport> {
    /// Creates a builder that reads the config file named by
    /// `GSDK_CONFIG_FILE` and heartbeats over HTTP.
    pub fn new() -> Self {
        Self {
            config: None,
            env: Arc::new(ProcessEnv),
            transport: None,
            connect: connect_http,
            interval: HeartbeatLoop::<HttpTransport>::DEFAULT_INTERVAL,
            debug_logs: false,
            install_logging: true,
        }
    }
}

impl Default for AgentBuilder<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HeartbeatTransport> AgentBuilder<T> {
    /// Uses this config instead of loading the file.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads environment variables from `env` instead of the process.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Sends heartbeats through `transport` instead of HTTP.
    pub fn transport<U: HeartbeatTransport>(self, transport: U) -> AgentBuilder<U> {
        AgentBuilder {
            config: self.config,
            env: self.env,
            transport: Some(transport),
            connect: |_| {
                Err(TransportError::Request("transport already consumed".into()))
            },
            interval: self.interval,
            debug_logs: self.debug_logs,
            install_logging: self.install_logging,
        }
    }

    /// Sets the steady heartbeat cadence.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Logs every heartbeat exchange at `debug`.
    pub fn debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }

    /// Whether startup installs the global `tracing` subscriber. On by
    /// default; it never replaces one that is already installed.
    pub fn install_logging(mut self, enabled: bool) -> Self {
        self.install_logging = enabled;
        self
    }

    /// Creates the agent. Nothing starts until it's first used.
    pub fn build(self) -> GameServerAgent<T> {
        GameServerAgent {
            callbacks: Arc::new(CallbackRegistry::new()),
            settings: Mutex::new(self),
            running: OnceLock::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// What startup produced.
struct Running {
    lifecycle: Arc<Lifecycle>,
    config: AgentConfig,
    task: JoinHandle<()>,
}

/// The game server's handle on the agent.
///
/// Create one per process and share it (it is `Send + Sync`). Dropping it
/// stops the heartbeat loop.
pub struct GameServerAgent<T = HttpTransport> {
    callbacks: Arc<CallbackRegistry>,
    /// Startup settings. Also serializes concurrent first-time starts.
    settings: Mutex<AgentBuilder<T>>,
    running: OnceLock<Running>,
}

impl GameServerAgent<HttpTransport> {
    /// Creates a new builder.
    pub fn builder() -> AgentBuilder<HttpTransport> {
        AgentBuilder::new()
    }

    /// An agent with default settings: config from `GSDK_CONFIG_FILE`,
    /// heartbeats over HTTP.
    pub fn new() -> Self {
        AgentBuilder::new().build()
    }
}

impl Default for GameServerAgent<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HeartbeatTransport> GameServerAgent<T> {
    // -- Startup --

    /// Starts the agent if it isn't running yet.
    ///
    /// Safe to call any number of times from any number of threads; only
    /// the first successful call does the work. A failed start leaves the
    /// agent unstarted, and the next call tries again.
    ///
    /// # Errors
    /// - [`AgentError::Config`]: the config is missing or invalid
    /// - [`AgentError::NoRuntime`]: not called within a Tokio runtime
    /// - [`AgentError::Transport`]: the HTTP client couldn't be built
    pub fn start(&self) -> Result<(), AgentError> {
        self.start_once().map(|_| ())
    }

    /// Like [`start`](Self::start), with every heartbeat exchange logged.
    /// Has no effect on an agent that is already running.
    pub fn start_with_debug_logs(&self) -> Result<(), AgentError> {
        self.settings.lock().debug_logs = true;
        self.start()
    }

    fn start_once(&self) -> Result<&Running, AgentError> {
        if let Some(running) = self.running.get() {
            return Ok(running);
        }

        let mut settings = self.settings.lock();
        // Another caller may have finished while we waited for the lock.
        if let Some(running) = self.running.get() {
            return Ok(running);
        }

        let running = launch(&mut settings, Arc::clone(&self.callbacks))?;
        Ok(self.running.get_or_init(|| running))
    }

    // -- Lifecycle --

    /// Tells the agent this server is ready, then waits until it's
    /// allocated.
    ///
    /// Returns `true` once the server is `Active`, or `false` if it's shut
    /// down first. Only one task should wait at a time.
    pub async fn ready_for_players(&self) -> Result<bool, AgentError> {
        let running = self.start_once()?;
        Ok(running.lifecycle.wait_until_active().await)
    }

    /// Marks a standing-by server as allocated without waiting for the
    /// agent to say so.
    ///
    /// # Errors
    /// Returns [`AgentError::Lifecycle`] unless the server is `StandingBy`.
    pub fn mark_allocated(&self) -> Result<(), AgentError> {
        self.start_once()?.lifecycle.mark_allocated()?;
        Ok(())
    }

    /// The current lifecycle state. [`GameState::Invalid`] before startup.
    pub fn state(&self) -> GameState {
        self.running
            .get()
            .map(|r| r.lifecycle.state())
            .unwrap_or_default()
    }

    // -- Game-facing data --

    /// Writes a line to the agent log.
    pub fn log_message(&self, message: &str) -> Result<(), AgentError> {
        self.start_once()?;
        info!(target: "hostlink::game", "{message}");
        Ok(())
    }

    /// Public address and port mapping for this server.
    pub fn connection_info(&self) -> Result<GameServerConnectionInfo, AgentError> {
        Ok(self.start_once()?.config.game_server_connection_info.clone())
    }

    /// Where the game should write its own logs.
    pub fn logs_directory(&self) -> Result<String, AgentError> {
        self.config_or_empty(keys::LOG_FOLDER)
    }

    /// Folder shared between all servers on this host.
    pub fn shared_content_directory(&self) -> Result<String, AgentError> {
        self.config_or_empty(keys::SHARED_CONTENT_FOLDER)
    }

    /// Players the session was created for, as last reported by the agent.
    pub fn initial_players(&self) -> Result<Vec<String>, AgentError> {
        Ok(self.start_once()?.lifecycle.initial_players())
    }

    /// Replaces the player list sent with each heartbeat.
    pub fn update_connected_players(
        &self,
        players: Vec<ConnectedPlayer>,
    ) -> Result<(), AgentError> {
        self.start_once()?.lifecycle.set_connected_players(players);
        Ok(())
    }

    /// A snapshot of every config value.
    pub fn config_settings(&self) -> Result<ConfigMap, AgentError> {
        Ok(self.start_once()?.lifecycle.config())
    }

    /// A single config value; see [`keys`] for the well-known ones.
    pub fn config_value(&self, key: &str) -> Result<Option<String>, AgentError> {
        Ok(self.start_once()?.lifecycle.config_value(key))
    }

    fn config_or_empty(&self, key: &str) -> Result<String, AgentError> {
        Ok(self.config_value(key)?.unwrap_or_default())
    }

    // -- Handlers --

    /// Called on every heartbeat; `true` means healthy. Without one the
    /// server reports itself unhealthy.
    pub fn register_health_callback(&self, f: impl Fn() -> bool + Send + Sync + 'static) {
        self.callbacks.set_health(f);
    }

    /// Called with the time of the next host maintenance whenever it moves
    /// later.
    pub fn register_maintenance_callback(
        &self,
        f: impl Fn(DateTime<Utc>) + Send + Sync + 'static,
    ) {
        self.callbacks.set_maintenance(f);
    }

    /// Called with each new revision of the detailed maintenance schedule.
    pub fn register_maintenance_schedule_callback(
        &self,
        f: impl Fn(&MaintenanceSchedule) + Send + Sync + 'static,
    ) {
        self.callbacks.set_maintenance_schedule(f);
    }

    /// Called once when the agent starts shutting this server down.
    pub fn register_shutdown_callback(&self, f: impl Fn() + Send + Sync + 'static) {
        self.callbacks.set_shutdown(f);
    }
}

impl<T> Drop for GameServerAgent<T> {
    fn drop(&mut self) {
        if let Some(running) = self.running.get() {
            running.task.abort();
        }
    }
}

impl<T> std::fmt::Debug for GameServerAgent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameServerAgent")
            .field("started", &self.running.get().is_some())
            .field("state", &self.running.get().map(|r| r.lifecycle.state()))
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Performs startup. Leaves `settings` untouched on failure so the next
/// attempt can retry.
fn launch<T: HeartbeatTransport>(
    settings: &mut AgentBuilder<T>,
    callbacks: Arc<CallbackRegistry>,
) -> Result<Running, AgentError> {
    let config = match &settings.config {
        Some(config) => {
            config.validate()?;
            config.clone()
        }
        None => AgentConfig::from_env(settings.env.as_ref())?,
    };

    if settings.install_logging {
        let folder = Path::new(&config.log_folder);
        if let Some(path) = logging::init(Some(folder), settings.debug_logs) {
            info!(path = %path.display(), "writing agent log");
        }
    }

    let handle = Handle::try_current().map_err(|_| AgentError::NoRuntime)?;
    let transport = match settings.transport.take() {
        Some(transport) => transport,
        None => (settings.connect)(&config)?,
    };

    let map = config.to_config_map(settings.env.as_ref());
    let lifecycle = Arc::new(Lifecycle::new(map, callbacks));
    let heartbeat = HeartbeatLoop::new(Arc::clone(&lifecycle), transport)
        .with_interval(settings.interval)
        .with_debug_logs(settings.debug_logs);

    info!(
        server_id = %config.session_host_id,
        endpoint = %config.heartbeat_endpoint,
        debug_logs = settings.debug_logs,
        "agent started"
    );
    if config.log_folder.is_empty() {
        warn!("no log folder configured");
    }

    let task = handle.spawn(heartbeat.run());
    Ok(Running { lifecycle, config, task })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use hostlink_config::ConfigError;

    use super::*;

    fn config() -> AgentConfig {
        AgentConfig {
            heartbeat_endpoint: "127.0.0.1:1".into(),
            session_host_id: "host-1".into(),
            log_folder: "/game/logs".into(),
            shared_content_folder: "/game/shared".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_state_is_invalid_before_start() {
        let agent = GameServerAgent::builder().config(config()).build();
        assert_eq!(agent.state(), GameState::Invalid);
    }

    #[test]
    fn test_start_without_runtime_fails_and_can_retry() {
        let agent = GameServerAgent::builder()
            .config(config())
            .install_logging(false)
            .build();
        assert!(matches!(agent.start(), Err(AgentError::NoRuntime)));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            agent.start().unwrap();
            assert_eq!(agent.state(), GameState::Initializing);
        });
    }

    #[test]
    fn test_missing_config_env_var_is_fatal() {
        let agent = GameServerAgent::builder()
            .env(HashMap::<String, String>::new())
            .install_logging(false)
            .build();
        let err = agent.start().unwrap_err();
        assert!(matches!(
            err,
            AgentError::Config(ConfigError::MissingEnvVar("GSDK_CONFIG_FILE"))
        ));
    }

    #[test]
    fn test_invalid_explicit_config_is_rejected() {
        let agent = GameServerAgent::builder()
            .config(AgentConfig::default())
            .install_logging(false)
            .build();
        assert!(matches!(
            agent.start(),
            Err(AgentError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[tokio::test]
    async fn test_directories_come_from_config() {
        let agent = GameServerAgent::builder()
            .config(config())
            .install_logging(false)
            .build();
        assert_eq!(agent.logs_directory().unwrap(), "/game/logs");
        assert_eq!(agent.shared_content_directory().unwrap(), "/game/shared");
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let agent = GameServerAgent::builder()
            .config(config())
            .install_logging(false)
            .build();
        agent.start().unwrap();
        agent.start().unwrap();
        agent.start_with_debug_logs().unwrap();
        assert_eq!(agent.state(), GameState::Initializing);
    }
}
