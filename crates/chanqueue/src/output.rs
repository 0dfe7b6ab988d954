//! Output side of an adapter, exposed as a `Stream`.

use futures_core::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pin_project! {
    /// Stream of items leaving an adapter, in the order they entered it.
    ///
    /// Yields `None` once the drain loop has terminated, whether it completed
    /// or was cancelled. After that it keeps yielding `None`.
    ///
    /// Dropping the stream (or calling [`close`](Self::close)) while the
    /// adapter is still running makes the drain loop stop with
    /// [`Termination::Disconnected`](crate::Termination::Disconnected).
    #[derive(Debug)]
    pub struct OutputStream<T> {
        #[pin]
        inner: ReceiverStream<T>,
        terminated: bool,
    }
}

impl<T> OutputStream<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            terminated: false,
        }
    }

    /// Receives the next item, or `None` once the output is closed.
    pub async fn recv(&mut self) -> Option<T> {
        if self.terminated {
            return None;
        }
        let rx: &mut mpsc::Receiver<T> = self.inner.as_mut();
        let item = rx.recv().await;
        if item.is_none() {
            self.terminated = true;
        }
        item
    }

    /// Closes the receiving side without dropping it.
    ///
    /// Items already in the output channel can still be received; nothing
    /// new will be forwarded.
    pub fn close(&mut self) {
        self.inner.close();
    }

    /// Returns `true` once the stream has yielded `None`.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T> Stream for OutputStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(None) => {
                *this.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.terminated {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}
