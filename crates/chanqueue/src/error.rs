//! Error types for chanqueue operations.
//!
//! Neither normal completion nor cancellation is an error: both are reported
//! through [`Termination`](crate::Termination). Errors only arise from a bad
//! configuration or from a loop task that did not run to its end.

use thiserror::Error;
use tokio::task::JoinError;

/// Errors that can occur while setting up or joining an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The configuration was rejected by [`QueueConfig::validate`](crate::QueueConfig::validate).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// No tokio runtime was available to spawn the intake and drain tasks.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    /// An intake or drain task panicked or was aborted.
    #[error("adapter task failed: {0}")]
    TaskFailed(String),
}

impl QueueError {
    /// Returns `true` if this error was raised before any task was spawned.
    #[inline]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::NoRuntime(_))
    }

    /// Returns `true` if a loop task ended abnormally.
    #[inline]
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed(_))
    }
}

impl From<JoinError> for QueueError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            Self::TaskFailed("task panicked".to_owned())
        } else {
            Self::TaskFailed(err.to_string())
        }
    }
}
