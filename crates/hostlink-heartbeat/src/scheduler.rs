//! The heartbeat loop.

use std::sync::Arc;
use std::time::Duration;

use hostlink_lifecycle::{Lifecycle, Transition};
use hostlink_protocol::{AgentInfo, HeartbeatResponse};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::{HeartbeatTransport, TransportError};

// ---------------------------------------------------------------------------
// Wake reason
// ---------------------------------------------------------------------------

/// Why the loop woke up for its next heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The lifecycle changed state and asked for an immediate report.
    Early,
    /// The regular interval elapsed.
    Interval,
}

// ---------------------------------------------------------------------------
// HeartbeatLoop
// ---------------------------------------------------------------------------

/// Periodically reports the lifecycle's state to the agent and feeds
/// the answers back in.
///
/// Exactly one heartbeat is in flight at a time. A failed exchange is
/// logged and skipped; the loop never gives up on its own and runs until
/// its task is aborted or the runtime shuts down.
pub struct HeartbeatLoop<T> {
    lifecycle: Arc<Lifecycle>,
    transport: T,
    interval: Duration,
    debug_logs: bool,
}

impl<T: HeartbeatTransport> HeartbeatLoop<T> {
    /// Steady cadence between heartbeats.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(lifecycle: Arc<Lifecycle>, transport: T) -> Self {
        Self {
            lifecycle,
            transport,
            interval: Self::DEFAULT_INTERVAL,
            debug_logs: false,
        }
    }

    /// Overrides the interval. A zero interval would spin, so it falls
    /// back to the default with a warning.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(
                default_ms = Self::DEFAULT_INTERVAL.as_millis() as u64,
                "heartbeat interval of zero, using default"
            );
            self.interval = Self::DEFAULT_INTERVAL;
        } else {
            self.interval = interval;
        }
        self
    }

    /// Logs every request/response pair and every early wake-up.
    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.debug_logs = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs the loop on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Announces the agent info, then heartbeats forever.
    pub async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "heartbeat loop started");
        self.announce().await;

        loop {
            let wake = self.next_wake().await;
            trace!(?wake, "heartbeat due");
            self.beat().await;
        }
    }

    /// Sends the one-time info document. Failure is not fatal.
    async fn announce(&self) {
        let info = AgentInfo::current();
        match self.transport.send_info(&info).await {
            Ok(()) => debug!(flavor = %info.flavor, version = %info.version, "sent agent info"),
            Err(e) => warn!(error = %e, "failed to send agent info"),
        }
    }

    /// Waits for whichever comes first: an early-heartbeat request or the
    /// end of the interval.
    ///
    /// The interval restarts on every call, so an early heartbeat pushes
    /// the next regular one a full interval out.
    pub async fn next_wake(&self) -> Wake {
        tokio::select! {
            biased;
            () = self.lifecycle.heartbeat_requested() => {
                if self.debug_logs {
                    debug!(state = %self.lifecycle.state(), "state changed, heartbeating early");
                }
                Wake::Early
            }
            () = time::sleep(self.interval) => Wake::Interval,
        }
    }

    /// Performs one heartbeat exchange and applies the answer.
    ///
    /// Returns the transition the answer caused, if any. Transport
    /// failures leave the lifecycle untouched; a body that can't be
    /// decoded is treated as an empty answer.
    pub async fn beat(&self) -> Option<Transition> {
        let request = self.lifecycle.heartbeat_request();

        let response = match self.transport.send_heartbeat(&request).await {
            Ok(response) => response,
            Err(e @ TransportError::Decode(_)) => {
                warn!(error = %e, "ignoring undecodable heartbeat response");
                HeartbeatResponse::default()
            }
            Err(e) => {
                warn!(error = %e, state = %request.current_game_state, "heartbeat failed");
                return None;
            }
        };

        if self.debug_logs {
            debug!(?request, ?response, "heartbeat exchanged");
        }

        self.lifecycle.apply_response(&response)
    }
}

impl<T> std::fmt::Debug for HeartbeatLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatLoop")
            .field("state", &self.lifecycle.state())
            .field("interval", &self.interval)
            .field("debug_logs", &self.debug_logs)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use hostlink_lifecycle::CallbackRegistry;
    use hostlink_protocol::{GameState, HeartbeatRequest, Operation};

    use super::*;

    /// Answers every heartbeat with the same operation.
    struct Fixed {
        operation: Operation,
        seen: Mutex<Vec<HeartbeatRequest>>,
    }

    impl Fixed {
        fn new(operation: Operation) -> Self {
            Self { operation, seen: Mutex::new(Vec::new()) }
        }
    }

    impl HeartbeatTransport for Fixed {
        async fn send_heartbeat(
            &self,
            request: &HeartbeatRequest,
        ) -> Result<HeartbeatResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(HeartbeatResponse { operation: self.operation, ..Default::default() })
        }

        async fn send_info(&self, _info: &AgentInfo) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct Failing;

    impl HeartbeatTransport for Failing {
        async fn send_heartbeat(
            &self,
            _request: &HeartbeatRequest,
        ) -> Result<HeartbeatResponse, TransportError> {
            Err(TransportError::Status(503))
        }

        async fn send_info(&self, _info: &AgentInfo) -> Result<(), TransportError> {
            Err(TransportError::Status(503))
        }
    }

    fn lifecycle() -> Arc<Lifecycle> {
        Arc::new(Lifecycle::new(Default::default(), Arc::new(CallbackRegistry::new())))
    }

    #[tokio::test]
    async fn test_beat_applies_operation() {
        let lc = lifecycle();
        let hb = HeartbeatLoop::new(Arc::clone(&lc), Fixed::new(Operation::Terminate));

        let transition = hb.beat().await.unwrap();
        assert_eq!(transition.from, GameState::Initializing);
        assert_eq!(transition.to, GameState::Terminating);
        assert_eq!(lc.state(), GameState::Terminating);
    }

    #[tokio::test]
    async fn test_beat_reports_current_state() {
        let lc = lifecycle();
        let hb = HeartbeatLoop::new(Arc::clone(&lc), Fixed::new(Operation::Continue));

        assert!(hb.beat().await.is_none());
        let seen = hb.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].current_game_state, GameState::Initializing);
    }

    #[tokio::test]
    async fn test_failed_beat_leaves_state_alone() {
        let lc = lifecycle();
        let hb = HeartbeatLoop::new(Arc::clone(&lc), Failing);

        assert!(hb.beat().await.is_none());
        assert_eq!(lc.state(), GameState::Initializing);
    }

    #[test]
    fn test_zero_interval_falls_back_to_default() {
        let hb = HeartbeatLoop::new(lifecycle(), Failing).with_interval(Duration::ZERO);
        assert_eq!(hb.interval(), HeartbeatLoop::<Failing>::DEFAULT_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_wake_waits_for_interval() {
        let hb = HeartbeatLoop::new(lifecycle(), Failing)
            .with_interval(Duration::from_millis(250));

        let start = time::Instant::now();
        assert_eq!(hb.next_wake().await, Wake::Interval);
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_wake_returns_early_on_request() {
        let lc = lifecycle();
        let hb = HeartbeatLoop::new(Arc::clone(&lc), Failing);

        lc.request_heartbeat();
        let start = time::Instant::now();
        assert_eq!(hb.next_wake().await, Wake::Early);
        assert!(start.elapsed() < hb.interval());
    }
}
