//! Single-fire "became active" signal.
//!
//! The readiness wait suspends until the server is allocated, or until it
//! is told to shut down before that ever happens. Both outcomes complete
//! the same signal, and each may happen at most once:
//!
//! ```text
//! Pending ──activate()──→ Activated ──close()──→ Closed
//!    └──────────────close()──────────────────────↑
//! ```
//!
//! A `tokio::sync::watch` channel holds the current [`Activation`]. Unlike
//! a oneshot, a watch value is sticky: a waiter that subscribes after the
//! signal fired sees it immediately instead of hanging.

use tokio::sync::watch;

use crate::SignalError;

/// Where the signal is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Nothing has happened yet. Waiters stay suspended.
    Pending,
    /// The server became active.
    Activated,
    /// The server is shutting down; no activation will follow.
    Closed,
}

/// Single-writer, multi-reader completion signal.
///
/// The lifecycle is the only writer. Completing twice is reported as a
/// [`SignalError`] instead of panicking.
#[derive(Debug)]
pub struct ActivationSignal {
    tx: watch::Sender<Activation>,
}

impl ActivationSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Activation::Pending);
        Self { tx }
    }

    /// Fires the signal, waking every waiter.
    ///
    /// # Errors
    /// - [`SignalError::AlreadyActivated`] if it already fired
    /// - [`SignalError::AlreadyClosed`] if it was closed first
    pub fn activate(&self) -> Result<(), SignalError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|current| match current {
            Activation::Pending => {
                *current = Activation::Activated;
                true
            }
            Activation::Activated => {
                result = Err(SignalError::AlreadyActivated);
                false
            }
            Activation::Closed => {
                result = Err(SignalError::AlreadyClosed);
                false
            }
        });
        result
    }

    /// Closes the signal. Waiters wake up and should re-check the state.
    ///
    /// # Errors
    /// Returns [`SignalError::AlreadyClosed`] on the second call.
    pub fn close(&self) -> Result<(), SignalError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|current| {
            if *current == Activation::Closed {
                result = Err(SignalError::AlreadyClosed);
                false
            } else {
                *current = Activation::Closed;
                true
            }
        });
        result
    }

    /// The current value, without waiting.
    pub fn current(&self) -> Activation {
        *self.tx.borrow()
    }

    /// Suspends until the signal leaves [`Activation::Pending`].
    pub async fn wait(&self) -> Activation {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|a| *a != Activation::Pending).await {
            Ok(value) => *value,
            // Unreachable while `self` holds the sender.
            Err(_) => Activation::Closed,
        }
    }
}

impl Default for ActivationSignal {
    fn default() -> Self {
        Self::new()
    }
}
