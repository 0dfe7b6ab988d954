//! External cancellation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable, broadcast "stop now" signal.
///
/// All clones observe the same state. The first call to [`cancel`](Self::cancel)
/// fires the signal; later calls are no-ops. Once fired it stays fired.
///
/// # Item loss
///
/// Cancelling an adapter is best-effort immediate, not graceful: items still
/// resident in the buffer when the drain loop observes the signal are dropped
/// without being forwarded.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    state: Arc<CancelState>,
}

impl CancelSignal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal, waking every task waiting in [`cancelled`](Self::cancelled).
    ///
    /// This method is idempotent.
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::AcqRel) {
            self.state.notify.notify_waiters();
        }
    }

    /// Returns `true` if the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Completes once the signal has fired. Returns immediately if it
    /// already has.
    pub async fn cancelled(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        loop {
            // Register before checking the flag so a concurrent `cancel()`
            // between the check and the await cannot be missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.state.notify.notified());
        }
    }
}
