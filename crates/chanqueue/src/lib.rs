//! Unbounded, order-preserving buffer between two async channels.
//!
//! `chanqueue` decouples a producer from a consumer running at a different
//! (typically slower) rate. An adapter interposes an unbounded FIFO between
//! an input stream and an output stream:
//!
//! ```text
//! input stream → intake loop → Buffer → drain loop → output stream
//! ```
//!
//! # Features
//!
//! - **Never blocks the producer**: the buffer is unbounded, so the intake
//!   loop only ever waits for the next input item
//! - **Event-driven**: a one-bit coalescing notifier wakes the drain loop;
//!   one wake-up drains an arbitrarily large backlog, no polling
//! - **Global FIFO**: items leave in exactly the order they arrived
//! - **Single backpressure point**: only the drain loop's send to a slow
//!   consumer can stall
//! - **Cooperative shutdown**: closing the input flushes the buffer then
//!   closes the output; cancellation stops immediately
//!
//! # Item loss on cancellation
//!
//! Cancellation is best-effort immediate. Items still buffered when the
//! drain loop observes the [`CancelSignal`] are dropped and reported as
//! abandoned in [`Termination::Cancelled`]. Without cancellation (and with
//! the output stream kept alive) no item is ever lost.
//!
//! # Example
//!
//! ```ignore
//! use chanqueue::{pipeline, CancelSignal, QueueConfig, StreamExt};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut out, handle) =
//!         pipeline::<u64>(QueueConfig::default(), CancelSignal::new()).unwrap();
//!
//!     // Fast producer
//!     tokio::spawn(async move {
//!         for i in 0..5 {
//!             tx.send(i).await.unwrap();
//!         }
//!         // Dropping `tx` closes the input
//!     });
//!
//!     // Slow consumer
//!     while let Some(item) = out.next().await {
//!         println!("Received: {}", item);
//!         tokio::time::sleep(Duration::from_millis(400)).await;
//!     }
//!
//!     assert!(handle.join().await.unwrap().is_complete());
//! }
//! ```

mod adapter;
mod buffer;
mod cancel;
mod config;
mod drain;
mod error;
mod intake;
mod invariants;
mod notify;
mod output;

pub use adapter::{pipeline, spawn_from_receiver, Adapter, AdapterHandle};
pub use buffer::Buffer;
pub use cancel::CancelSignal;
pub use config::{IntakePolicy, QueueConfig};
pub use drain::Termination;
pub use error::QueueError;
pub use output::OutputStream;

// Re-export useful stream combinators
pub use tokio_stream::StreamExt;
