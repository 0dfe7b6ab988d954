//! Intake loop: input stream to buffer.

use crate::buffer::Buffer;
use crate::cancel::CancelSignal;
use crate::config::IntakePolicy;
use crate::notify::NotifySender;
use futures_core::Stream;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

/// How the intake loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntakeEnd {
    /// The input stream was exhausted.
    InputClosed { received: u64 },
    /// Cancellation fired under [`IntakePolicy::StopOnCancel`].
    Cancelled { received: u64 },
}

/// Moves every item of `input` into `buffer`, signalling after each push.
///
/// The notifier is closed when this function returns (the sender is dropped
/// with it), which tells the drain loop that no new data will arrive.
pub(crate) async fn run_intake<T, S>(
    input: S,
    buffer: Arc<Buffer<T>>,
    notify: NotifySender,
    cancel: CancelSignal,
    policy: IntakePolicy,
) -> IntakeEnd
where
    S: Stream<Item = T> + Send,
{
    tokio::pin!(input);
    let mut received = 0u64;

    let end = loop {
        let next = match policy {
            IntakePolicy::RunToCompletion => input.next().await,
            IntakePolicy::StopOnCancel => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break IntakeEnd::Cancelled { received },
                    next = input.next() => next,
                }
            }
        };

        let Some(item) = next else {
            break IntakeEnd::InputClosed { received };
        };

        buffer.push(item);
        received += 1;
        notify.notify();
        trace!(received, "item buffered");
    };

    debug!(?end, resident = buffer.len(), "intake loop finished");
    drop(notify);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{notifier, Wake};

    #[tokio::test]
    async fn test_moves_all_items_and_closes_notifier() {
        let buffer = Arc::new(Buffer::new());
        let (tx, rx) = notifier();

        let end = run_intake(
            tokio_stream::iter(0..5u32),
            Arc::clone(&buffer),
            tx,
            CancelSignal::new(),
            IntakePolicy::RunToCompletion,
        )
        .await;

        assert_eq!(end, IntakeEnd::InputClosed { received: 5 });
        assert_eq!(rx.wait().await, Wake::Closed);
        let items: Vec<_> = std::iter::from_fn(|| buffer.pop()).collect();
        assert_eq!(items, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_input_closes_immediately() {
        let buffer = Arc::new(Buffer::<u32>::new());
        let (tx, rx) = notifier();

        let end = run_intake(
            tokio_stream::empty(),
            Arc::clone(&buffer),
            tx,
            CancelSignal::new(),
            IntakePolicy::RunToCompletion,
        )
        .await;

        assert_eq!(end, IntakeEnd::InputClosed { received: 0 });
        assert!(rx.is_closed());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_run_to_completion_ignores_cancel() {
        let buffer = Arc::new(Buffer::new());
        let (tx, _rx) = notifier();
        let cancel = CancelSignal::new();
        cancel.cancel();

        let end = run_intake(
            tokio_stream::iter(0..3u32),
            Arc::clone(&buffer),
            tx,
            cancel,
            IntakePolicy::RunToCompletion,
        )
        .await;

        assert_eq!(end, IntakeEnd::InputClosed { received: 3 });
        assert_eq!(buffer.len(), 3);
    }

    #[tokio::test]
    async fn test_stop_on_cancel_stops_pending_intake() {
        let buffer = Arc::new(Buffer::<u32>::new());
        let (tx, rx) = notifier();
        let cancel = CancelSignal::new();

        let task = tokio::spawn(run_intake(
            tokio_stream::pending(),
            Arc::clone(&buffer),
            tx,
            cancel.clone(),
            IntakePolicy::StopOnCancel,
        ));

        tokio::task::yield_now().await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), IntakeEnd::Cancelled { received: 0 });
        assert_eq!(rx.wait().await, Wake::Closed);
    }
}
