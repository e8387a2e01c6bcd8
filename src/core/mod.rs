//! Core scheduling abstractions: tasks, queueing, dispatch, and attempts.

pub mod audit;
pub mod error;
pub mod executor;
pub mod queue;
pub mod retry;
pub mod scheduler;
pub mod task;

mod attempt;
mod dispatcher;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use error::{AppResult, SchedulerError, SyncError};
pub use executor::SyncExecutor;
pub use queue::TaskQueue;
pub use retry::RetryPolicy;
pub use scheduler::{QueueStats, TaskScheduler};
pub use task::{Priority, SyncOutcome, Task, TaskId, TaskResult, TaskStatus};
