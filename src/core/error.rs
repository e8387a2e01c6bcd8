//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced when building the scheduler or submitting work to it.
///
/// Task failures never surface here; they are recorded in the result store.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A task was submitted without any target ids.
    #[error("task has no target ids")]
    EmptyTargets,
    /// Queue is at its configured maximum depth.
    #[error("queue full: max depth {0} reached")]
    QueueFull(usize),
    /// No tokio runtime was available to spawn onto.
    #[error("no tokio runtime available; call from within a runtime or supply a handle")]
    NoRuntime,
}

/// Failure of a single sync attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The external system rejected or failed the sync.
    #[error("{0}")]
    Remote(String),
    /// The attempt did not finish within the per-attempt timeout.
    #[error("sync timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout that elapsed.
        timeout_ms: u64,
    },
    /// The sync capability panicked.
    #[error("sync panicked: {0}")]
    Panicked(String),
}

impl SyncError {
    /// Build a remote failure from any displayable message.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
