//! Task and result models.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::clock::now_ms;

/// Opaque task identifier, stable across retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TaskId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Priority tier. Ordering is `High < Medium < Low`: lower sorts first and
/// drains first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Drained before everything else.
    High,
    /// Default tier.
    #[default]
    Medium,
    /// Drained last; may starve under sustained higher-priority load.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// One unit of sync work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, kept across retries.
    pub id: TaskId,
    /// External entities to synchronize, in order.
    pub target_ids: Vec<String>,
    /// Queue tier.
    pub priority: Priority,
    /// Creation time in milliseconds since epoch.
    pub created_at_ms: u128,
    /// Number of retries already scheduled for this task.
    pub retry_count: u32,
}

impl Task {
    /// Create a task with a fresh id and zero retries.
    #[must_use]
    pub fn new(target_ids: Vec<String>, priority: Priority) -> Self {
        Self {
            id: TaskId::new(),
            target_ids,
            priority,
            created_at_ms: now_ms(),
            retry_count: 0,
        }
    }

    /// Copy of this task for the next attempt.
    #[must_use]
    pub fn next_attempt(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

/// Observable status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Queued, or waiting out a retry delay.
    Pending,
    /// An attempt is in flight.
    Running,
    /// Sync succeeded.
    Completed,
    /// Retries exhausted.
    Failed,
    /// Removed from the queue before dispatch.
    Cancelled,
}

impl TaskStatus {
    /// Whether the task will never be scheduled again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Counts reported by a successful sync call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Targets synchronized successfully.
    pub successful: u64,
    /// Targets the external system reported as failed.
    pub failed: u64,
}

/// Recorded outcome of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task this result belongs to.
    pub task_id: TaskId,
    /// Final status.
    pub status: TaskStatus,
    /// Start of the last attempt (or of the cancellation), ms since epoch.
    pub start_time_ms: u128,
    /// End of the last attempt, ms since epoch.
    pub end_time_ms: u128,
    /// `end_time_ms - start_time_ms`.
    pub duration_ms: u128,
    /// Successful count from sync, 0 if never reached.
    pub successful: u64,
    /// Failed count from sync, 0 if never reached.
    pub failed: u64,
    /// Error message; set iff `status` is `Failed`.
    pub error: Option<String>,
    /// Number of sync invocations made.
    pub attempts: u32,
}

impl TaskResult {
    /// Successful completion.
    #[must_use]
    pub fn completed(
        task: &Task,
        start_time_ms: u128,
        end_time_ms: u128,
        outcome: SyncOutcome,
    ) -> Self {
        Self {
            task_id: task.id,
            status: TaskStatus::Completed,
            start_time_ms,
            end_time_ms,
            duration_ms: end_time_ms.saturating_sub(start_time_ms),
            successful: outcome.successful,
            failed: outcome.failed,
            error: None,
            attempts: task.retry_count + 1,
        }
    }

    /// Terminal failure after the last allowed attempt.
    #[must_use]
    pub fn failed(
        task: &Task,
        start_time_ms: u128,
        end_time_ms: u128,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task.id,
            status: TaskStatus::Failed,
            start_time_ms,
            end_time_ms,
            duration_ms: end_time_ms.saturating_sub(start_time_ms),
            successful: 0,
            failed: 0,
            error: Some(error.into()),
            attempts: task.retry_count + 1,
        }
    }

    /// Cancellation before dispatch. A task cancelled while waiting for a
    /// retry has already made `retry_count` attempts.
    #[must_use]
    pub fn cancelled(task: &Task) -> Self {
        let now = now_ms();
        Self {
            task_id: task.id,
            status: TaskStatus::Cancelled,
            start_time_ms: now,
            end_time_ms: now,
            duration_ms: 0,
            successful: 0,
            failed: 0,
            error: None,
            attempts: task.retry_count,
        }
    }
}
