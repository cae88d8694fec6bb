//! Core protocol types for the heartbeat exchange.
//!
//! These are the structures serialized to JSON, POSTed to the agent, and
//! parsed back out of its reply. Field names follow the agent's wire format
//! exactly: requests use PascalCase, responses use camelCase, and the
//! maintenance schedule (which the agent forwards verbatim from the host's
//! scheduled-events feed) is PascalCase again.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameState: where the game server is in its lifecycle
// ---------------------------------------------------------------------------

/// The game server's coarse-grained lifecycle phase, as reported to the agent.
///
/// Transitions only move forward:
///
/// ```text
/// Initializing → StandingBy → Active → Terminating → Terminated
///        └──────────────────────↑
/// ```
///
/// `Quarantined` exists on the wire but is never entered by this crate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum GameState {
    /// Not started yet.
    #[default]
    Invalid,
    /// Started, loading assets. Not ready for players.
    Initializing,
    /// Ready for players, waiting to be allocated.
    StandingBy,
    /// Allocated: a session is running on this server.
    Active,
    /// The agent asked this server to shut down.
    Terminating,
    /// Shutdown finished.
    Terminated,
    /// Unused.
    Quarantined,
}

impl GameState {
    /// Returns `true` once the server has been told to shut down.
    pub fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Terminating | Self::Terminated)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Initializing => "Initializing",
            Self::StandingBy => "StandingBy",
            Self::Active => "Active",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Quarantined => "Quarantined",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Operation: what the agent wants us to do next
// ---------------------------------------------------------------------------

/// The agent's instruction embedded in a heartbeat response.
///
/// Unknown strings deserialize to [`Operation::Invalid`] so a newer agent
/// can't break an older game server.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Operation {
    /// Keep doing what you're doing.
    Continue,
    /// You've been allocated.
    Active,
    /// Shut down.
    Terminate,
    /// Missing or unrecognized. Must stay last for `#[serde(other)]`.
    #[default]
    #[serde(other)]
    Invalid,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Continue => "Continue",
            Self::Active => "Active",
            Self::Terminate => "Terminate",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// GameHealth
// ---------------------------------------------------------------------------

/// Health reported on every heartbeat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum GameHealth {
    Healthy,
    /// Reported when no health callback is registered.
    #[default]
    Unhealthy,
}

impl From<bool> for GameHealth {
    fn from(healthy: bool) -> Self {
        if healthy { Self::Healthy } else { Self::Unhealthy }
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player currently connected to the game server.
///
/// The identifier is opaque: it is whatever the game's own identity
/// system uses, and is never validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectedPlayer {
    #[serde(rename = "PlayerId")]
    pub player_id: String,
}

impl ConnectedPlayer {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Heartbeat request / response
// ---------------------------------------------------------------------------

/// Body of every heartbeat POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeartbeatRequest {
    pub current_game_state: GameState,
    pub current_game_health: GameHealth,
    /// Ordered as supplied by the game.
    pub current_players: Vec<ConnectedPlayer>,
}

/// Body of every heartbeat reply.
///
/// Every field is optional on the wire. `HeartbeatResponse::default()` is
/// the "nothing to do" response: no session data, no maintenance, and an
/// [`Operation::Invalid`] that the state machine ignores.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_config: Option<SessionConfig>,

    /// RFC 3339 timestamp of the next scheduled host maintenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scheduled_maintenance_utc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_schedule: Option<MaintenanceSchedule>,

    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub operation: Operation,
}

impl HeartbeatResponse {
    /// Parses `next_scheduled_maintenance_utc`.
    ///
    /// Returns `None` when the field is absent or isn't valid RFC 3339;
    /// the agent's timestamp is advisory, so a bad value is dropped rather
    /// than treated as an error.
    pub fn next_maintenance(&self) -> Option<DateTime<Utc>> {
        let raw = self.next_scheduled_maintenance_utc.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Session data delivered when the server is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub session_id: String,
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub session_cookie: String,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub initial_players: Vec<String>,
    /// Arbitrary key/value pairs merged into the config map.
    #[serde(
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "crate::nullable::or_default"
    )]
    pub metadata: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Maintenance schedule
// ---------------------------------------------------------------------------

/// Detailed maintenance notice forwarded by the agent.
///
/// `document_incarnation` changes whenever the host publishes a new
/// version of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MaintenanceSchedule {
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub document_incarnation: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub events: Vec<MaintenanceEvent>,
}

/// One event inside a [`MaintenanceSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MaintenanceEvent {
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub event_id: String,
    /// e.g. `Reboot`, `Redeploy`, `Freeze`.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub event_type: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub resource_type: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub resources: Vec<String>,
    /// e.g. `Scheduled`, `Started`.
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub event_status: String,
    pub not_before: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub description: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub event_source: String,
    #[serde(deserialize_with = "crate::nullable::or_default")]
    pub duration_in_seconds: i64,
}

// ---------------------------------------------------------------------------
// Agent info
// ---------------------------------------------------------------------------

/// Announced once to the agent's metrics endpoint before heartbeating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentInfo {
    pub flavor: String,
    pub version: String,
}

impl AgentInfo {
    /// Info describing this build of Hostlink.
    pub fn current() -> Self {
        Self {
            flavor: "Rust".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
