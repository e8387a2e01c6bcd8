//! # Sync Scheduler
//!
//! A priority-ordered, bounded-concurrency scheduler for background jobs that
//! propagate application-status changes to an external system.
//!
//! The scheduler never talks to the external system itself. It calls an
//! injected [`core::SyncExecutor`] under a per-attempt timeout, retries failed
//! attempts after a delay up to a limit, and keeps the latest outcome of every
//! task for later inspection.
//!
//! ## Key Features
//!
//! - **Priority queue**: `high` drains before `medium` before `low`, FIFO within a tier
//! - **Bounded concurrency**: at most `max_concurrent_tasks` attempts in flight
//! - **Timeouts and retries**: each attempt is raced against `task_timeout_ms`;
//!   failures are re-queued after `retry_delay_ms` until `max_retries` is used up
//! - **Graceful control**: `start`, `pause`, draining `stop`, and cancellation of
//!   tasks that have not been dispatched yet
//! - **Introspection**: per-task status and result, queue statistics, lifecycle audit
//!
//! ## Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use sync_scheduler::builders::SchedulerBuilder;
//! use sync_scheduler::core::{Priority, SyncError, SyncExecutor, SyncOutcome};
//! use std::time::Duration;
//!
//! struct PlatformSync;
//!
//! #[async_trait]
//! impl SyncExecutor for PlatformSync {
//!     async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
//!         Ok(SyncOutcome { successful: target_ids.len() as u64, failed: 0 })
//!     }
//! }
//!
//! let scheduler = SchedulerBuilder::new()
//!     .with_max_concurrent_tasks(2)
//!     .with_retry_delay(Duration::from_millis(500))
//!     .build(PlatformSync)?;
//!
//! let id = scheduler.add_task(["application-42"], Priority::High)?;
//! scheduler.start();
//! // ...
//! scheduler.stop().await;
//! println!("{:?}", scheduler.get_task_result(&id));
//! ```
//!
//! The scheduler is an ordinary value owned by its caller; clone the handle to
//! share it between request handlers.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Configuration models and loading.
pub mod config;
/// Core scheduling abstractions: tasks, queueing, dispatch, and attempts.
pub mod core;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// In-memory backends for the queue and result store.
pub mod infra;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::builders::SchedulerBuilder;
pub use crate::config::SchedulerConfig;
pub use crate::core::{
    Priority, QueueStats, SchedulerError, SyncError, SyncExecutor, SyncOutcome, TaskId,
    TaskResult, TaskScheduler, TaskStatus,
};
