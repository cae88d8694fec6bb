//! The lifecycle state machine.
//!
//! # Transitions
//!
//! ```text
//!                 wait_until_active()
//!   Initializing ───────────────────→ StandingBy
//!        │                                │
//!        │ op: Active        op: Active / mark_allocated()
//!        ▼                                ▼
//!      Active ←───────────────────────────┘
//!        │
//!        │ op: Terminate (from any state, once)
//!        ▼
//!   Terminating
//! ```
//!
//! States never move backwards. A repeated operation that targets the
//! current state is a no-op, which is what makes `Active` fire the
//! activation signal once and `Terminate` fire the shutdown handler once.
//!
//! # Locking
//!
//! All mutable state sits behind a single mutex. The heartbeat loop and
//! the game's own threads both go through it, and no handler is ever
//! invoked while it is held.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hostlink_config::{ConfigMap, keys};
use hostlink_protocol::{
    ConnectedPlayer, GameState, HeartbeatRequest, HeartbeatResponse,
    MaintenanceSchedule, Operation, SessionConfig,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tracing::{debug, info, warn};

use crate::{Activation, ActivationSignal, CallbackRegistry, LifecycleError};

/// A state change applied by the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GameState,
    pub to: GameState,
}

/// Everything guarded by the lifecycle lock.
#[derive(Debug)]
struct Shared {
    state: GameState,
    config: ConfigMap,
    initial_players: Vec<String>,
    connected_players: Vec<ConnectedPlayer>,
    /// Latest maintenance time the game was told about.
    last_maintenance: Option<DateTime<Utc>>,
    /// Incarnation of the last schedule handed to the game.
    last_schedule_incarnation: Option<String>,
}

impl Shared {
    fn merge_session(&mut self, session: &SessionConfig) {
        if !session.session_id.is_empty() {
            self.config
                .insert(keys::SESSION_ID.to_string(), session.session_id.clone());
        }
        if !session.session_cookie.is_empty() {
            self.config.insert(
                keys::SESSION_COOKIE.to_string(),
                session.session_cookie.clone(),
            );
        }
        if !session.initial_players.is_empty() {
            self.initial_players = session.initial_players.clone();
        }
        self.config.extend(
            session
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Returns the maintenance time to announce, if it's newer than the
    /// last one announced.
    fn take_new_maintenance(
        &mut self,
        at: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if self.last_maintenance.is_some_and(|cached| at <= cached) {
            return None;
        }
        self.last_maintenance = Some(at);
        Some(at)
    }

    fn take_new_schedule(
        &mut self,
        schedule: &MaintenanceSchedule,
    ) -> Option<MaintenanceSchedule> {
        let incarnation = schedule.document_incarnation.as_str();
        if self.last_schedule_incarnation.as_deref() == Some(incarnation) {
            return None;
        }
        self.last_schedule_incarnation = Some(incarnation.to_string());
        Some(schedule.clone())
    }

    fn apply_operation(&mut self, operation: Operation) -> Option<Transition> {
        let target = match operation {
            Operation::Continue => return None,
            Operation::Invalid => {
                debug!("heartbeat response carried no valid operation");
                return None;
            }
            Operation::Active => {
                if self.state == GameState::Active {
                    return None;
                }
                if self.state.is_shutting_down() {
                    debug!(state = %self.state, "ignoring Active while shutting down");
                    return None;
                }
                GameState::Active
            }
            Operation::Terminate => {
                if self.state.is_shutting_down() {
                    return None;
                }
                GameState::Terminating
            }
        };
        Some(self.set_state(target))
    }

    fn set_state(&mut self, to: GameState) -> Transition {
        let from = self.state;
        self.state = to;
        Transition { from, to }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Current lifecycle state plus the data heartbeats update with it.
///
/// One instance exists per running agent. It is shared (`Arc`) between the
/// heartbeat loop, which feeds it responses, and the game-facing façade.
pub struct Lifecycle {
    shared: Mutex<Shared>,
    activation: ActivationSignal,
    /// Raised on every transition so the loop heartbeats early.
    wake: Notify,
    callbacks: Arc<CallbackRegistry>,
}

impl Lifecycle {
    /// Creates a lifecycle in [`GameState::Initializing`].
    pub fn new(config: ConfigMap, callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                state: GameState::Initializing,
                config,
                initial_players: Vec::new(),
                connected_players: Vec::new(),
                last_maintenance: None,
                last_schedule_incarnation: None,
            }),
            activation: ActivationSignal::new(),
            wake: Notify::new(),
            callbacks,
        }
    }

    // -- Accessors --

    pub fn state(&self) -> GameState {
        self.shared.lock().state
    }

    pub fn activation(&self) -> Activation {
        self.activation.current()
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// A copy of the whole config map.
    pub fn config(&self) -> ConfigMap {
        self.shared.lock().config.clone()
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.shared.lock().config.get(key).cloned()
    }

    /// Players the session was allocated with. Empty until allocation.
    pub fn initial_players(&self) -> Vec<String> {
        self.shared.lock().initial_players.clone()
    }

    /// Replaces the connected-player list reported on each heartbeat.
    pub fn set_connected_players(&self, players: Vec<ConnectedPlayer>) {
        self.shared.lock().connected_players = players;
    }

    // -- Heartbeat plumbing --

    /// Builds the next heartbeat request.
    ///
    /// Calls the game's health handler first, outside the lock.
    pub fn heartbeat_request(&self) -> HeartbeatRequest {
        let health = self.callbacks.health();
        let shared = self.shared.lock();
        HeartbeatRequest {
            current_game_state: shared.state,
            current_game_health: health,
            current_players: shared.connected_players.clone(),
        }
    }

    /// Asks the heartbeat loop to send its next beat right away.
    ///
    /// If the loop is mid-beat, the request is remembered and the following
    /// beat goes out immediately.
    pub fn request_heartbeat(&self) {
        self.wake.notify_one();
    }

    /// Resolves when [`request_heartbeat`](Self::request_heartbeat) is called.
    pub fn heartbeat_requested(&self) -> Notified<'_> {
        self.wake.notified()
    }

    // -- Transitions --

    /// Moves to `StandingBy` and suspends until the server is allocated.
    ///
    /// Returns `true` if the server is `Active` when the wait ends, and
    /// `false` if it was told to terminate instead. Returns immediately
    /// when already `Active` or already shutting down.
    ///
    /// Only one caller is expected to wait at a time.
    pub async fn wait_until_active(&self) -> bool {
        let transition = {
            let mut shared = self.shared.lock();
            match shared.state {
                GameState::Active => return true,
                state if state.is_shutting_down() => return false,
                GameState::StandingBy => None,
                _ => Some(shared.set_state(GameState::StandingBy)),
            }
        };
        if let Some(transition) = transition {
            self.on_transition(transition);
        }

        self.activation.wait().await;
        self.state() == GameState::Active
    }

    /// Marks the server allocated without waiting for the agent to say so.
    ///
    /// # Errors
    /// Returns [`LifecycleError::InvalidState`] unless the server is exactly
    /// `StandingBy`. The state is left unchanged.
    pub fn mark_allocated(&self) -> Result<(), LifecycleError> {
        let transition = {
            let mut shared = self.shared.lock();
            if shared.state != GameState::StandingBy {
                return Err(LifecycleError::InvalidState {
                    expected: GameState::StandingBy,
                    actual: shared.state,
                });
            }
            shared.set_state(GameState::Active)
        };
        self.on_transition(transition);
        Ok(())
    }

    /// Applies one heartbeat response.
    ///
    /// In order: merges session data into the config map, announces newer
    /// maintenance, then applies the operation. Returns the resulting state
    /// change, if any.
    pub fn apply_response(
        &self,
        response: &HeartbeatResponse,
    ) -> Option<Transition> {
        let maintenance = response.next_maintenance();
        if maintenance.is_none() && response.next_scheduled_maintenance_utc.is_some() {
            debug!(
                value = ?response.next_scheduled_maintenance_utc,
                "ignoring unparsable maintenance time"
            );
        }

        let (maintenance, schedule, transition) = {
            let mut shared = self.shared.lock();
            if let Some(session) = &response.session_config {
                shared.merge_session(session);
            }
            let maintenance =
                maintenance.and_then(|at| shared.take_new_maintenance(at));
            let schedule = response
                .maintenance_schedule
                .as_ref()
                .and_then(|s| shared.take_new_schedule(s));
            let transition = shared.apply_operation(response.operation);
            (maintenance, schedule, transition)
        };

        if let Some(at) = maintenance {
            info!(at = %at, "maintenance scheduled");
            self.callbacks.notify_maintenance(at);
        }
        if let Some(schedule) = schedule {
            info!(
                incarnation = %schedule.document_incarnation,
                events = schedule.events.len(),
                "maintenance schedule updated"
            );
            self.callbacks.notify_maintenance_schedule(&schedule);
        }
        if let Some(transition) = transition {
            self.on_transition(transition);
        }
        transition
    }

    /// Side effects of a state change. Runs without the lock held.
    fn on_transition(&self, transition: Transition) {
        info!(
            from = %transition.from,
            to = %transition.to,
            "lifecycle state changed"
        );
        self.request_heartbeat();

        match transition.to {
            GameState::Active => {
                if let Err(e) = self.activation.activate() {
                    warn!(error = %e, "could not signal activation");
                }
            }
            GameState::Terminating => {
                self.callbacks.notify_shutdown();
                if let Err(e) = self.activation.close() {
                    warn!(error = %e, "could not close activation signal");
                }
            }
            _ => {}
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("activation", &self.activation())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(ConfigMap::new(), Arc::new(CallbackRegistry::new()))
    }

    fn force_state(lifecycle: &Lifecycle, state: GameState) {
        lifecycle.shared.lock().state = state;
    }

    fn with_op(operation: Operation) -> HeartbeatResponse {
        HeartbeatResponse {
            operation,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_is_initializing() {
        let lc = lifecycle();
        assert_eq!(lc.state(), GameState::Initializing);
        assert_eq!(lc.activation(), Activation::Pending);
    }

    #[test]
    fn test_active_ignored_while_terminating() {
        let lc = lifecycle();
        force_state(&lc, GameState::Terminating);
        assert_eq!(lc.apply_response(&with_op(Operation::Active)), None);
        assert_eq!(lc.state(), GameState::Terminating);
    }

    #[test]
    fn test_invalid_operation_is_noop() {
        let lc = lifecycle();
        force_state(&lc, GameState::StandingBy);
        assert_eq!(lc.apply_response(&HeartbeatResponse::default()), None);
        assert_eq!(lc.state(), GameState::StandingBy);
    }

    #[test]
    fn test_session_merge_skips_empty_values() {
        let lc = lifecycle();
        let response = HeartbeatResponse {
            session_config: Some(SessionConfig {
                session_id: "abc".into(),
                ..Default::default()
            }),
            ..with_op(Operation::Continue)
        };
        lc.apply_response(&response);
        assert_eq!(lc.config_value(keys::SESSION_ID).as_deref(), Some("abc"));
        assert_eq!(lc.config_value(keys::SESSION_COOKIE), None);
    }

    #[test]
    fn test_metadata_overwrites_existing_keys() {
        let config = HashMap::from([("map".to_string(), "old".to_string())]);
        let lc = Lifecycle::new(config, Arc::new(CallbackRegistry::new()));
        let response = HeartbeatResponse {
            session_config: Some(SessionConfig {
                metadata: HashMap::from([("map".into(), "new".into())]),
                ..Default::default()
            }),
            ..Default::default()
        };
        lc.apply_response(&response);
        assert_eq!(lc.config_value("map").as_deref(), Some("new"));
    }

    #[test]
    fn test_transition_requests_early_heartbeat() {
        let lc = lifecycle();
        force_state(&lc, GameState::StandingBy);
        lc.mark_allocated().unwrap();

        // The stored permit makes `notified()` complete on first poll.
        let notified = lc.heartbeat_requested();
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        let mut notified = std::pin::pin!(notified);
        assert!(notified.as_mut().poll(&mut cx).is_ready());
    }

    #[test]
    fn test_debug_format() {
        let text = format!("{:?}", lifecycle());
        assert!(text.contains("Initializing"));
    }
}
