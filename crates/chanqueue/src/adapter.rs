//! Adapter construction: wires the intake and drain loops around one buffer.

use crate::buffer::Buffer;
use crate::cancel::CancelSignal;
use crate::config::QueueConfig;
use crate::drain::{run_drain, Termination};
use crate::error::QueueError;
use crate::intake::{run_intake, IntakeEnd};
#[cfg(debug_assertions)]
use crate::invariants::debug_assert_forwarded_bounded;
use crate::notify::notifier;
use crate::output::OutputStream;
use futures_core::Stream;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, debug_span, Instrument};

/// Creates an input channel and an adapter draining it.
///
/// Returns the input sender, the output stream and a handle to the running
/// adapter. Drop every clone of the sender to signal end of input; the
/// output stream yields `None` once everything sent has been forwarded.
///
/// Must be called from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// use chanqueue::{pipeline, CancelSignal, QueueConfig, StreamExt};
///
/// #[tokio::main]
/// async fn main() {
///     let (tx, mut out, handle) =
///         pipeline::<u64>(QueueConfig::default(), CancelSignal::new()).unwrap();
///
///     tokio::spawn(async move {
///         for i in 0..10 {
///             tx.send(i).await.unwrap();
///         }
///     });
///
///     while let Some(item) = out.next().await {
///         println!("Received: {}", item);
///     }
///     assert!(handle.join().await.unwrap().is_complete());
/// }
/// ```
pub fn pipeline<T: Send + 'static>(
    config: QueueConfig,
    cancel: CancelSignal,
) -> Result<(mpsc::Sender<T>, OutputStream<T>, AdapterHandle<T>), QueueError> {
    config.validate()?;
    if config.input_capacity == 0 {
        return Err(QueueError::InvalidConfig("input_capacity must be at least 1"));
    }
    let (tx, rx) = mpsc::channel(config.input_capacity);
    let (output, handle) = spawn_from_receiver(rx, config, cancel)?;
    Ok((tx, output, handle))
}

/// Spawns an adapter over an existing tokio receiver.
///
/// The receiver's senders belong to the caller, who closes the input by
/// dropping them.
pub fn spawn_from_receiver<T: Send + 'static>(
    input: mpsc::Receiver<T>,
    config: QueueConfig,
    cancel: CancelSignal,
) -> Result<(OutputStream<T>, AdapterHandle<T>), QueueError> {
    Adapter::new(config)
        .with_cancel(cancel)
        .spawn(ReceiverStream::new(input))
}

/// Builder for an adapter instance.
///
/// An adapter runs exactly two tasks: an intake loop moving items from the
/// input stream into an unbounded buffer, and a drain loop forwarding them
/// to the output stream in the same order.
#[derive(Debug, Clone, Default)]
pub struct Adapter {
    config: QueueConfig,
    cancel: CancelSignal,
}

impl Adapter {
    /// Creates a builder with the given configuration and a fresh,
    /// never-fired cancellation signal.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            cancel: CancelSignal::new(),
        }
    }

    /// Uses `cancel` as the external cancellation signal.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Spawns the intake and drain tasks over `input`.
    ///
    /// The adapter never closes `input`; it stops reading once the stream
    /// ends (or on cancellation, under [`IntakePolicy::StopOnCancel`](crate::IntakePolicy)).
    pub fn spawn<T, S>(self, input: S) -> Result<(OutputStream<T>, AdapterHandle<T>), QueueError>
    where
        T: Send + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|e| QueueError::NoRuntime(e.to_string()))?;

        let Self { config, cancel } = self;
        let buffer = Arc::new(Buffer::with_capacity(config.initial_capacity));
        let (notify_tx, notify_rx) = notifier();
        let (out_tx, out_rx) = mpsc::channel(config.output_capacity);

        let intake = runtime.spawn(
            run_intake(
                input,
                Arc::clone(&buffer),
                notify_tx,
                cancel.clone(),
                config.intake_policy,
            )
            .instrument(debug_span!("intake", queue = %config.name)),
        );

        let drain = runtime.spawn(
            run_drain(Arc::clone(&buffer), notify_rx, out_tx, cancel.clone())
                .instrument(debug_span!("drain", queue = %config.name)),
        );

        debug!(queue = %config.name, policy = ?config.intake_policy, "adapter spawned");

        let handle = AdapterHandle {
            buffer,
            cancel,
            intake,
            drain,
        };
        Ok((OutputStream::new(out_rx), handle))
    }
}

/// Handle to a running adapter.
///
/// Dropping the handle does not stop the adapter; its tasks keep running
/// until they terminate on their own.
#[derive(Debug)]
pub struct AdapterHandle<T> {
    buffer: Arc<Buffer<T>>,
    cancel: CancelSignal,
    intake: JoinHandle<IntakeEnd>,
    drain: JoinHandle<Termination>,
}

impl<T> AdapterHandle<T> {
    /// Number of items currently held in the buffer.
    ///
    /// Grows while the output consumer is slower than the producer and
    /// shrinks back as it catches up.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Fires the adapter's cancellation signal.
    ///
    /// See [`CancelSignal`] for the item-loss contract.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a clone of the adapter's cancellation signal.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Returns `true` once the drain loop has terminated and the output is
    /// closed.
    pub fn is_finished(&self) -> bool {
        self.drain.is_finished()
    }

    /// Waits for the drain loop to terminate and reports how it ended.
    ///
    /// After a clean completion the intake loop has necessarily finished
    /// too and is joined as well, so a panic in either task surfaces as
    /// [`QueueError::TaskFailed`]. After cancellation or disconnection the
    /// intake loop may still be waiting on its input; it is joined only if
    /// it has already stopped, otherwise it is left to finish on its own.
    pub async fn join(self) -> Result<Termination, QueueError> {
        let termination = self.drain.await?;

        if termination.is_complete() || self.intake.is_finished() {
            let intake_end = self.intake.await?;
            debug!(?intake_end, ?termination, "adapter joined");
        } else {
            debug!(?termination, "adapter joined, intake still running");
        }

        #[cfg(debug_assertions)]
        debug_assert_forwarded_bounded!(termination.forwarded(), self.buffer.popped());

        Ok(termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = Adapter::new(QueueConfig::default()).spawn(tokio_stream::iter(0..3u32));
        let err = result.unwrap_err();
        assert!(matches!(err, QueueError::NoRuntime(_)));
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = QueueConfig::default().with_output_capacity(0);
        let err = pipeline::<u32>(config, CancelSignal::new()).unwrap_err();
        assert_eq!(
            err,
            QueueError::InvalidConfig("output_capacity must be at least 1")
        );
    }

    #[tokio::test]
    async fn test_input_capacity_only_checked_by_pipeline() {
        let config = QueueConfig::default().with_input_capacity(0);

        let err = pipeline::<u32>(config.clone(), CancelSignal::new()).unwrap_err();
        assert_eq!(
            err,
            QueueError::InvalidConfig("input_capacity must be at least 1")
        );

        // A caller-provided stream has no input channel to size.
        let (out, handle) = Adapter::new(config)
            .spawn(tokio_stream::iter(0..3u32))
            .unwrap();
        assert_eq!(out.collect::<Vec<_>>().await, vec![0, 1, 2]);
        assert!(handle.join().await.unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_spawn_over_iterator_stream() {
        let (mut out, handle) = Adapter::new(QueueConfig::default())
            .spawn(tokio_stream::iter(vec!["a", "b", "c"]))
            .unwrap();

        let mut received = Vec::new();
        while let Some(item) = out.next().await {
            received.push(item);
        }
        assert_eq!(received, vec!["a", "b", "c"]);

        let termination = handle.join().await.unwrap();
        assert_eq!(termination, Termination::Completed { forwarded: 3 });
    }

    #[tokio::test]
    async fn test_intake_panic_surfaces_on_join() {
        let input = tokio_stream::iter(0..3u32).map(|i| {
            assert!(i < 2, "producer blew up");
            i
        });
        let (mut out, handle) = Adapter::new(QueueConfig::default()).spawn(input).unwrap();

        // The notifier closes during unwind, so the drain loop still finishes.
        let mut received = Vec::new();
        while let Some(item) = out.next().await {
            received.push(item);
        }
        assert_eq!(received, vec![0, 1]);

        let err = handle.join().await.unwrap_err();
        assert!(err.is_task_failure());
    }
}
