//! One-bit coalescing wake signal between the intake and drain loops.
//!
//! `Notify::notify_one` stores at most one permit when nobody is waiting, so
//! any number of notifications between two waits collapse into a single
//! wake-up. Closing sets a flag and hands out one more permit, which the
//! receiver reports as [`Wake::Closed`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
struct Shared {
    notify: Notify,
    closed: AtomicBool,
}

/// What woke the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// Data was pushed at least once since the last wake.
    Signalled,
    /// The sending half is gone; no new data will arrive.
    Closed,
}

/// Sending half, held by the intake loop.
///
/// Dropping it closes the notifier.
#[derive(Debug)]
pub(crate) struct NotifySender {
    shared: Arc<Shared>,
}

/// Receiving half, held by the drain loop.
#[derive(Debug)]
pub(crate) struct NotifyReceiver {
    shared: Arc<Shared>,
}

/// Creates a connected notifier pair.
pub(crate) fn notifier() -> (NotifySender, NotifyReceiver) {
    let shared = Arc::new(Shared {
        notify: Notify::new(),
        closed: AtomicBool::new(false),
    });
    (
        NotifySender {
            shared: Arc::clone(&shared),
        },
        NotifyReceiver { shared },
    )
}

impl NotifySender {
    /// Signals that data is available. Never blocks; coalesces with a
    /// pending signal.
    #[inline]
    pub(crate) fn notify(&self) {
        self.shared.notify.notify_one();
    }
}

impl Drop for NotifySender {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }
}

impl NotifyReceiver {
    /// Waits until signalled or closed.
    ///
    /// Cancel-safe: dropping the future before it completes loses no signal,
    /// since the permit stays in the `Notify` until a waiter consumes it.
    pub(crate) async fn wait(&self) -> Wake {
        if self.is_closed() {
            return Wake::Closed;
        }
        self.shared.notify.notified().await;
        if self.is_closed() {
            Wake::Closed
        } else {
            Wake::Signalled
        }
    }

    /// Returns `true` once the sending half has been dropped.
    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}
