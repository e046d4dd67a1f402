//! Cancellation context handed to every handler invocation.
//!
//! The server owns one [`CancelHandle`] and gives each connection a
//! [`Context`] cloned from it. `shutdown` fires the handle. Cancellation is
//! cooperative: a handler that never looks at its context runs to
//! completion, and `shutdown` waits for it.

use tokio::sync::watch;

/// A read-only view of a cancellation signal.
///
/// Cloning is cheap; every clone observes the same signal.
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: watch::Receiver<bool>,
}

impl Context {
    /// Creates a fresh context together with the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let handle = CancelHandle::new();
        (handle.context(), handle)
    }

    /// Returns `true` once the context has been cancelled.
    ///
    /// A context whose handle was dropped counts as cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow() || self.cancelled.has_changed().is_err()
    }

    /// Completes when the context is cancelled.
    ///
    /// Meant for `tokio::select!` next to the handler's own work.
    pub async fn cancelled(&self) {
        let mut cancelled = self.cancelled.clone();
        // An error means the handle is gone, which ends the context too.
        let _ = cancelled.wait_for(|cancelled| *cancelled).await;
    }
}

/// The owning side of a [`Context`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        Self {
            tx: watch::Sender::new(false),
        }
    }

    /// Returns a new context tied to this handle.
    pub fn context(&self) -> Context {
        Context {
            cancelled: self.tx.subscribe(),
        }
    }

    /// Cancels every context derived from this handle. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}
