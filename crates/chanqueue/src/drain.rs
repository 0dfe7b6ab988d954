//! Drain loop: buffer to output stream.

use crate::buffer::Buffer;
use crate::cancel::CancelSignal;
#[cfg(debug_assertions)]
use crate::invariants::{debug_assert_drain_accounting, debug_assert_drained_on_completion};
use crate::notify::{NotifyReceiver, Wake};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// How an adapter's drain loop ended.
///
/// None of these is an error. In every case the output stream has been
/// closed by the time the report is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The input closed and every buffered item was forwarded.
    Completed {
        /// Items delivered to the output stream.
        forwarded: u64,
    },

    /// Cancellation fired while the drain loop was waiting for data.
    ///
    /// `abandoned` items were still buffered and will never be delivered.
    /// The count is a snapshot: under [`IntakePolicy::RunToCompletion`](crate::IntakePolicy)
    /// the intake loop may keep buffering items that are dropped with the
    /// adapter.
    Cancelled {
        /// Items delivered to the output stream.
        forwarded: u64,
        /// Items left undelivered when the drain loop stopped.
        abandoned: usize,
    },

    /// The output stream's receiver was dropped, so nothing more could be
    /// delivered.
    Disconnected {
        /// Items delivered to the output stream.
        forwarded: u64,
        /// Items left undelivered, including the one whose send failed.
        abandoned: usize,
    },
}

impl Termination {
    /// Items delivered to the output stream.
    pub fn forwarded(&self) -> u64 {
        match *self {
            Self::Completed { forwarded }
            | Self::Cancelled { forwarded, .. }
            | Self::Disconnected { forwarded, .. } => forwarded,
        }
    }

    /// Items that were accepted but never delivered.
    pub fn abandoned(&self) -> usize {
        match *self {
            Self::Completed { .. } => 0,
            Self::Cancelled { abandoned, .. } | Self::Disconnected { abandoned, .. } => abandoned,
        }
    }

    /// Returns `true` if every accepted item was delivered.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainState {
    /// Pop and forward until the buffer reports empty.
    Draining,
    /// Block on the notifier or the cancellation signal.
    Waiting,
    /// Input is closed: flush what is left, then stop.
    DrainingFinal,
}

/// Forwards buffered items to `output` until the input is exhausted and the
/// buffer is empty, the cancellation signal fires, or the receiver goes away.
///
/// The output stream is closed when this function returns, since `output`
/// is the only sender and is dropped with it.
///
/// Cancellation is only observed while waiting for data. A send blocked on a
/// slow consumer is the pipeline's single backpressure point and is allowed
/// to complete.
pub(crate) async fn run_drain<T>(
    buffer: Arc<Buffer<T>>,
    notify: NotifyReceiver,
    output: mpsc::Sender<T>,
    cancel: CancelSignal,
) -> Termination {
    let mut forwarded = 0u64;
    let mut state = DrainState::Draining;

    let termination = loop {
        state = match state {
            DrainState::Draining | DrainState::DrainingFinal => match buffer.pop() {
                Some(item) => {
                    if output.send(item).await.is_err() {
                        break Termination::Disconnected {
                            forwarded,
                            abandoned: buffer.len() + 1,
                        };
                    }
                    forwarded += 1;
                    trace!(forwarded, "item forwarded");
                    state
                }
                None if state == DrainState::DrainingFinal => {
                    break Termination::Completed { forwarded };
                }
                None => DrainState::Waiting,
            },
            DrainState::Waiting => {
                // The notifier only says "non-empty at least once"; the next
                // Draining pass re-checks the buffer either way.
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        break Termination::Cancelled {
                            forwarded,
                            abandoned: buffer.len(),
                        };
                    }
                    wake = notify.wait() => match wake {
                        Wake::Signalled => DrainState::Draining,
                        Wake::Closed => DrainState::DrainingFinal,
                    },
                }
            }
        };
    };

    #[cfg(debug_assertions)]
    {
        debug_assert_drained_on_completion!(termination.is_complete(), buffer.len());
        let in_flight = u64::from(matches!(termination, Termination::Disconnected { .. }));
        debug_assert_drain_accounting!(buffer.popped(), termination.forwarded(), in_flight);
    }

    debug!(?termination, "drain loop finished, closing output");
    drop(output);
    termination
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::notifier;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_flushes_backlog_after_close() {
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, mut out_rx) = mpsc::channel(16);

        for i in 0..5u32 {
            buffer.push(i);
        }
        // No notification at all: closing alone must trigger the final flush.
        drop(tx);

        let termination = run_drain(Arc::clone(&buffer), rx, out_tx, CancelSignal::new()).await;
        assert_eq!(termination, Termination::Completed { forwarded: 5 });

        let mut received = Vec::new();
        while let Some(item) = out_rx.recv().await {
            received.push(item);
        }
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_single_signal_drains_whole_backlog() {
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, mut out_rx) = mpsc::channel(1);

        let drain = tokio::spawn(run_drain(Arc::clone(&buffer), rx, out_tx, CancelSignal::new()));

        for i in 0..100u32 {
            buffer.push(i);
        }
        tx.notify();

        for expected in 0..100u32 {
            let item = timeout(Duration::from_secs(1), out_rx.recv())
                .await
                .expect("backlog should drain from one signal");
            assert_eq!(item, Some(expected));
        }

        drop(tx);
        assert_eq!(out_rx.recv().await, None);
        assert!(drain.await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_abandons_backlog() {
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let cancel = CancelSignal::new();

        let drain = tokio::spawn(run_drain(Arc::clone(&buffer), rx, out_tx, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Pushed without a signal, so the drain loop stays in Waiting.
        buffer.push(1u32);
        buffer.push(2u32);
        cancel.cancel();

        let termination = timeout(Duration::from_secs(1), drain)
            .await
            .expect("cancel should terminate promptly")
            .unwrap();
        assert_eq!(
            termination,
            Termination::Cancelled {
                forwarded: 0,
                abandoned: 2
            }
        );
        assert_eq!(out_rx.recv().await, None);
        drop(tx);
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_disconnected() {
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, out_rx) = mpsc::channel(1);
        drop(out_rx);

        buffer.push(1u32);
        buffer.push(2u32);
        drop(tx);

        let termination = run_drain(Arc::clone(&buffer), rx, out_tx, CancelSignal::new()).await;
        assert_eq!(
            termination,
            Termination::Disconnected {
                forwarded: 0,
                abandoned: 2
            }
        );
        assert_eq!(termination.abandoned(), 2);
        assert!(!termination.is_complete());
    }

    #[tokio::test]
    async fn test_every_accepted_item_is_accounted_for() {
        // Completed: everything pushed was popped and forwarded.
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        for i in 0..6u32 {
            buffer.push(i);
        }
        drop(tx);
        let done = run_drain(Arc::clone(&buffer), rx, out_tx, CancelSignal::new()).await;
        assert_eq!(buffer.popped(), done.forwarded());
        assert_eq!(buffer.pushed(), done.forwarded() + done.abandoned() as u64);
        assert_eq!(out_rx.recv().await, Some(0));

        // Cancelled: whatever was popped got forwarded, the rest stays resident.
        let buffer = Arc::new(Buffer::new());
        let (_tx, rx) = notifier();
        let (out_tx, _out_rx) = mpsc::channel(8);
        let cancel = CancelSignal::new();
        buffer.push(1u32);
        buffer.push(2u32);
        cancel.cancel();
        let cancelled = run_drain(Arc::clone(&buffer), rx, out_tx, cancel).await;
        assert_eq!(buffer.popped(), cancelled.forwarded());
        assert_eq!(
            buffer.pushed(),
            cancelled.forwarded() + cancelled.abandoned() as u64
        );

        // Disconnected: one popped item is lost with the failed send.
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();
        let (out_tx, out_rx) = mpsc::channel(8);
        drop(out_rx);
        for i in 0..3u32 {
            buffer.push(i);
        }
        drop(tx);
        let disconnected = run_drain(Arc::clone(&buffer), rx, out_tx, CancelSignal::new()).await;
        assert_eq!(buffer.popped(), disconnected.forwarded() + 1);
        assert_eq!(
            buffer.pushed(),
            disconnected.forwarded() + disconnected.abandoned() as u64
        );
    }

    #[test]
    fn test_termination_accessors() {
        let done = Termination::Completed { forwarded: 7 };
        assert_eq!(done.forwarded(), 7);
        assert_eq!(done.abandoned(), 0);
        assert!(done.is_complete());

        let cancelled = Termination::Cancelled {
            forwarded: 3,
            abandoned: 4,
        };
        assert_eq!(cancelled.forwarded(), 3);
        assert_eq!(cancelled.abandoned(), 4);
        assert!(!cancelled.is_complete());
    }
}
