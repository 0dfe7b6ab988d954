//! Configuration for adapter behavior.

use crate::error::QueueError;

/// How the intake loop reacts to the cancellation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntakePolicy {
    /// Keep ingesting until the input stream ends, ignoring cancellation.
    ///
    /// In-flight work is always moved into the buffer; only the drain loop
    /// honors cancellation.
    #[default]
    RunToCompletion,

    /// Stop ingesting as soon as cancellation fires.
    ///
    /// The input stream is dropped, so a producer blocked on a bounded
    /// input channel observes the channel as closed.
    StopOnCancel,
}

/// Configuration for an adapter instance.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Label attached to the tracing spans of both loops.
    ///
    /// Default: `"chanqueue"`
    pub name: String,

    /// Pre-allocated slots in the internal buffer.
    ///
    /// This is not a bound; the buffer grows past it as needed.
    ///
    /// Default: 64
    pub initial_capacity: usize,

    /// Slots in the input channel created by [`pipeline`](crate::pipeline).
    ///
    /// Ignored when the adapter is spawned over a caller-provided stream.
    ///
    /// Default: 1
    pub input_capacity: usize,

    /// Slots in the output channel.
    ///
    /// With 1, a send completes as soon as the previous item was taken,
    /// which is the closest tokio equivalent of a rendezvous channel.
    ///
    /// Default: 1
    pub output_capacity: usize,

    /// Intake loop cancellation policy.
    ///
    /// Default: [`IntakePolicy::RunToCompletion`]
    pub intake_policy: IntakePolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "chanqueue".to_owned(),
            initial_capacity: 64,
            input_capacity: 1,
            output_capacity: 1,
            intake_policy: IntakePolicy::RunToCompletion,
        }
    }
}

impl QueueConfig {
    /// Creates a low-latency configuration: small allocations, rendezvous-like
    /// channels on both sides.
    pub fn low_latency() -> Self {
        Self {
            initial_capacity: 16,
            ..Self::default()
        }
    }

    /// Creates a high-throughput configuration with larger channel slots.
    pub fn high_throughput() -> Self {
        Self {
            initial_capacity: 4096,
            input_capacity: 256,
            output_capacity: 256,
            ..Self::default()
        }
    }

    /// Sets the tracing label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the initial buffer capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Sets the input channel capacity.
    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    /// Sets the output channel capacity.
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Sets the intake cancellation policy.
    pub fn with_intake_policy(mut self, policy: IntakePolicy) -> Self {
        self.intake_policy = policy;
        self
    }

    /// Checks that the configuration can be used to spawn an adapter.
    ///
    /// tokio's bounded channels panic on a zero capacity, so the output
    /// capacity must be at least 1. `input_capacity` is not checked here
    /// because only [`pipeline`](crate::pipeline) creates an input channel;
    /// it checks that field itself.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.output_capacity == 0 {
            return Err(QueueError::InvalidConfig(
                "output_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}
