//! Demonstration of chanqueue decoupling a fast producer from a slow consumer.
//!
//! Run with: `cargo run -p chanqueue --features demo --bin demo`
//!
//! Set `RUST_LOG=chanqueue=debug` to see the adapter's own lifecycle events.

use chanqueue::{pipeline, CancelSignal, QueueConfig, StreamExt, Termination};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing_subscriber::EnvFilter;

/// Unit of work flowing through the demo pipeline.
#[derive(Debug)]
struct Task {
    id: usize,
    data: String,
}

const TASK_COUNT: usize = 5;
const PRODUCE_EVERY: Duration = Duration::from_millis(200);
const CONSUME_EVERY: Duration = Duration::from_millis(400);
/// Fires between the second and third task, well before input closes.
const CANCEL_AFTER: Duration = Duration::from_millis(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== chanqueue Demo ===\n");

    demo_slow_consumer().await?;
    demo_cancellation().await?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Demo 1: producer every 200ms, consumer every 400ms, clean completion
async fn demo_slow_consumer() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Slow Consumer ---");

    let (produced, consumed, termination) = run(CancelSignal::new(), None).await?;

    println!("  -produced: {} tasks, -consumed: {} tasks", produced, consumed);
    println!("  Termination: {:?}", termination);
    println!("  ✓ Slow consumer complete\n");
    Ok(())
}

/// Demo 2: the same pipeline, cancelled while the consumer is still behind
async fn demo_cancellation() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Cancellation ---");

    let cancel = CancelSignal::new();
    let (produced, consumed, termination) = run(cancel, Some(CANCEL_AFTER)).await?;

    println!("  -produced: {} tasks, -consumed: {} tasks", produced, consumed);
    println!(
        "  Termination: {:?} ({} tasks abandoned)",
        termination,
        termination.abandoned()
    );
    println!("  ✓ Cancellation complete\n");
    Ok(())
}

async fn run(
    cancel: CancelSignal,
    cancel_after: Option<Duration>,
) -> Result<(usize, usize, Termination), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let elapsed = move || start.elapsed().as_millis();

    let (tx, mut out, handle) = pipeline::<Task>(QueueConfig::default().with_name("demo"), cancel)?;

    let produced = Arc::new(AtomicUsize::new(0));
    let producer = {
        let produced = Arc::clone(&produced);
        tokio::spawn(async move {
            println!("  Producer: started. ({}ms)", elapsed());
            for id in 0..TASK_COUNT {
                let task = Task {
                    id,
                    data: format!("Task #{}", id),
                };
                println!("  Producer: Sending {}  ({}ms)", task.data, elapsed());
                if tx.send(task).await.is_err() {
                    println!("  Producer: input closed early ({}ms)", elapsed());
                    return;
                }
                produced.fetch_add(1, Ordering::Relaxed);
                sleep(PRODUCE_EVERY).await;
            }
            drop(tx);
            println!(
                "  Producer: All tasks sent, input channel closed. ({}ms)",
                elapsed()
            );
        })
    };

    if let Some(delay) = cancel_after {
        let signal = handle.cancel_signal();
        tokio::spawn(async move {
            sleep(delay).await;
            println!("  Main: Timeout reached, cancelling. ({}ms)", elapsed());
            signal.cancel();
        });
    }

    println!("  Consumer: started. ({}ms)", elapsed());
    let mut consumed = 0;
    while let Some(task) = out.next().await {
        consumed += 1;
        println!(
            "  Consumer: Received {} (id {})  ({}ms)",
            task.data,
            task.id,
            elapsed()
        );
        sleep(CONSUME_EVERY).await;
    }
    println!(
        "  Consumer: All tasks processed, output channel closed. ({}ms)",
        elapsed()
    );

    let termination = handle.join().await?;
    producer.await?;
    Ok((produced.load(Ordering::Relaxed), consumed, termination))
}
