//! Lifecycle audit sinks.
//!
//! The scheduler reports every task transition to an optional [`AuditSink`].
//! The in-memory sink keeps a bounded ring buffer and is what the integration
//! tests use to observe start ordering.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{Priority, TaskId};
use crate::util::clock::now_ms;

/// Lifecycle transition of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Accepted by `add_task`.
    Submitted,
    /// An attempt was dispatched.
    Started,
    /// An attempt failed and a retry was scheduled.
    RetryScheduled,
    /// The retry delay elapsed and the task re-entered the queue.
    Requeued,
    /// Sync succeeded.
    Completed,
    /// Retries exhausted.
    Failed,
    /// Removed before dispatch.
    Cancelled,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Related task.
    pub task_id: TaskId,
    /// Transition.
    pub action: AuditAction,
    /// Task priority at the time of the event.
    pub priority: Priority,
    /// Retry count of the task copy involved.
    pub retry_count: u32,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context (error message for failures).
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared sinks let the caller keep a handle for inspection.
impl<S: AuditSink> AuditSink for Arc<Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Sink that forwards events as `tracing` records at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::debug!(
            task_id = %event.task_id,
            action = ?event.action,
            priority = %event.priority,
            retry_count = event.retry_count,
            detail = event.detail.as_deref().unwrap_or(""),
            "task audit"
        );
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_audit_event(
    task_id: TaskId,
    action: AuditAction,
    priority: Priority,
    retry_count: u32,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        task_id,
        action,
        priority,
        retry_count,
        created_at_ms: now_ms(),
        detail,
    }
}
