//! Builder for [`TaskScheduler`].

use std::time::Duration;

use tokio::runtime::Handle;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, SchedulerError, SyncExecutor, TaskQueue, TaskScheduler};
use crate::infra::InMemoryQueue;
use crate::runtime::TokioSpawner;

/// Builder for a [`TaskScheduler`]. Starts from [`SchedulerConfig::default`].
pub struct SchedulerBuilder<Q = InMemoryQueue> {
    config: SchedulerConfig,
    queue: Q,
    runtime: Option<Handle>,
    audit: Option<Box<dyn AuditSink>>,
}

impl SchedulerBuilder<InMemoryQueue> {
    /// Create a builder with default configuration and an in-memory queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            queue: InMemoryQueue::new(),
            runtime: None,
            audit: None,
        }
    }
}

impl Default for SchedulerBuilder<InMemoryQueue> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q> SchedulerBuilder<Q>
where
    Q: TaskQueue + 'static,
{
    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency cap.
    #[must_use]
    pub fn with_max_concurrent_tasks(mut self, n: usize) -> Self {
        self.config.max_concurrent_tasks = n;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.config.task_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the delay before a failed attempt is re-queued.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = duration_ms(delay);
        self
    }

    /// Set the number of additional attempts after the first.
    #[must_use]
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    /// Set the dispatcher backstop tick.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = duration_ms(interval);
        self
    }

    /// Grow the retry delay by `multiplier` per retry.
    #[must_use]
    pub fn with_retry_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config.retry_backoff_multiplier = multiplier;
        self
    }

    /// Reject submissions once `depth` tasks are queued.
    #[must_use]
    pub fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.config.max_queue_depth = Some(depth);
        self
    }

    /// Keep at most `n` results, evicting the oldest.
    #[must_use]
    pub fn with_max_stored_results(mut self, n: usize) -> Self {
        self.config.max_stored_results = Some(n);
        self
    }

    /// Spawn onto this runtime instead of the one current at `build` time.
    #[must_use]
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Report task lifecycle events to `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Use a different queue backend. Tasks already in it form the backlog.
    #[must_use]
    pub fn with_queue<Q2>(self, queue: Q2) -> SchedulerBuilder<Q2>
    where
        Q2: TaskQueue + 'static,
    {
        SchedulerBuilder {
            config: self.config,
            queue,
            runtime: self.runtime,
            audit: self.audit,
        }
    }

    /// Configuration accumulated so far.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler. The scheduler is
    /// created stopped; call [`TaskScheduler::start`].
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] if validation fails, and
    /// [`SchedulerError::NoRuntime`] if no runtime handle was given and the
    /// caller is not inside a tokio runtime.
    pub fn build<E>(self, executor: E) -> Result<TaskScheduler<E, Q>, SchedulerError>
    where
        E: SyncExecutor,
    {
        self.config
            .validate()
            .map_err(SchedulerError::InvalidConfig)?;
        let spawner = match self.runtime {
            Some(handle) => TokioSpawner::new(handle),
            None => TokioSpawner::current()?,
        };
        tracing::debug!(config = ?self.config, "building scheduler");
        Ok(TaskScheduler::from_parts(
            self.config,
            executor,
            self.queue,
            spawner,
            self.audit,
        ))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
