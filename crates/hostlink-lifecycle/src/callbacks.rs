//! Handlers the game registers to hear from the agent.
//!
//! Each slot holds at most one handler; registering again replaces it.
//! Handlers are invoked synchronously on the heartbeat loop's task, so a
//! slow handler delays the next heartbeat. The health check in particular
//! runs on every beat and must return promptly.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hostlink_protocol::{GameHealth, MaintenanceSchedule};
use parking_lot::Mutex;

type HealthFn = Arc<dyn Fn() -> bool + Send + Sync>;
type MaintenanceFn = Arc<dyn Fn(DateTime<Utc>) + Send + Sync>;
type ScheduleFn = Arc<dyn Fn(&MaintenanceSchedule) + Send + Sync>;
type ShutdownFn = Arc<dyn Fn() + Send + Sync>;

/// The game's optional handlers.
///
/// Slots are cloned out of their lock before invocation, so a handler may
/// itself register or replace handlers without deadlocking.
#[derive(Default)]
pub struct CallbackRegistry {
    health: Mutex<Option<HealthFn>>,
    maintenance: Mutex<Option<MaintenanceFn>>,
    maintenance_schedule: Mutex<Option<ScheduleFn>>,
    shutdown: Mutex<Option<ShutdownFn>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Registration --

    /// Sets the health predicate. `true` means healthy.
    pub fn set_health(&self, f: impl Fn() -> bool + Send + Sync + 'static) {
        *self.health.lock() = Some(Arc::new(f));
    }

    /// Sets the handler for "host maintenance scheduled at this UTC time".
    pub fn set_maintenance(
        &self,
        f: impl Fn(DateTime<Utc>) + Send + Sync + 'static,
    ) {
        *self.maintenance.lock() = Some(Arc::new(f));
    }

    /// Sets the handler for detailed maintenance schedules.
    pub fn set_maintenance_schedule(
        &self,
        f: impl Fn(&MaintenanceSchedule) + Send + Sync + 'static,
    ) {
        *self.maintenance_schedule.lock() = Some(Arc::new(f));
    }

    /// Sets the handler for "the agent is shutting this server down".
    pub fn set_shutdown(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.shutdown.lock() = Some(Arc::new(f));
    }

    // -- Dispatch --

    /// Asks the game how it's doing.
    ///
    /// No handler counts as unhealthy: the agent should never assume a
    /// server is fine just because it didn't say otherwise.
    pub fn health(&self) -> GameHealth {
        let handler = self.health.lock().clone();
        handler
            .map(|f| GameHealth::from(f()))
            .unwrap_or(GameHealth::Unhealthy)
    }

    /// Returns `true` if a handler was invoked.
    pub fn notify_maintenance(&self, at: DateTime<Utc>) -> bool {
        let handler = self.maintenance.lock().clone();
        handler.map(|f| f(at)).is_some()
    }

    /// Returns `true` if a handler was invoked.
    pub fn notify_maintenance_schedule(
        &self,
        schedule: &MaintenanceSchedule,
    ) -> bool {
        let handler = self.maintenance_schedule.lock().clone();
        handler.map(|f| f(schedule)).is_some()
    }

    /// Returns `true` if a handler was invoked.
    pub fn notify_shutdown(&self) -> bool {
        let handler = self.shutdown.lock().clone();
        handler.map(|f| f()).is_some()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("health", &self.health.lock().is_some())
            .field("maintenance", &self.maintenance.lock().is_some())
            .field(
                "maintenance_schedule",
                &self.maintenance_schedule.lock().is_some(),
            )
            .field("shutdown", &self.shutdown.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_health_defaults_to_unhealthy() {
        let registry = CallbackRegistry::new();
        assert_eq!(registry.health(), GameHealth::Unhealthy);
    }

    #[test]
    fn test_health_uses_handler() {
        let registry = CallbackRegistry::new();
        registry.set_health(|| true);
        assert_eq!(registry.health(), GameHealth::Healthy);
        registry.set_health(|| false);
        assert_eq!(registry.health(), GameHealth::Unhealthy);
    }

    #[test]
    fn test_notify_without_handler_returns_false() {
        let registry = CallbackRegistry::new();
        assert!(!registry.notify_shutdown());
        assert!(!registry.notify_maintenance(Utc::now()));
        assert!(!registry.notify_maintenance_schedule(&MaintenanceSchedule::default()));
    }

    #[test]
    fn test_registering_again_replaces_handler() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let registry = CallbackRegistry::new();

        let counter = Arc::clone(&first);
        registry.set_shutdown(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&second);
        registry.set_shutdown(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registry.notify_shutdown());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_can_reregister_from_inside_dispatch() {
        let registry = Arc::new(CallbackRegistry::new());
        let inner = Arc::clone(&registry);
        registry.set_shutdown(move || inner.set_shutdown(|| {}));
        assert!(registry.notify_shutdown());
    }

    #[test]
    fn test_debug_shows_registered_slots() {
        let registry = CallbackRegistry::new();
        registry.set_health(|| true);
        let text = format!("{registry:?}");
        assert!(text.contains("health: true"));
        assert!(text.contains("shutdown: false"));
    }
}
