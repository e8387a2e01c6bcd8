//! Per-task attempt: timeout, outcome classification, retry scheduling.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::core::scheduler::Shared;
use crate::core::{
    AuditAction, SyncError, SyncExecutor, SyncOutcome, Task, TaskId, TaskQueue, TaskResult,
    TaskStatus,
};
use crate::util::clock::now_ms;

impl<E, Q> Shared<E, Q>
where
    E: SyncExecutor,
    Q: TaskQueue + 'static,
{
    /// Run one attempt of `task`, which the dispatcher has already placed in
    /// the in-flight set.
    ///
    /// Boxed because an attempt re-enters the dispatcher, which spawns further
    /// attempts.
    pub(crate) fn run_attempt(
        self: Arc<Self>,
        task: Task,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        Box::pin(async move {
            let start_ms = now_ms();
            let attempt = task.retry_count + 1;
            debug!(task_id = %task.id, attempt, targets = task.target_ids.len(), "attempt started");

            let outcome = self.call_sync(&task).await;
            let end_ms = now_ms();

            match outcome {
                Ok(counts) => {
                    info!(
                        task_id = %task.id,
                        attempt,
                        successful = counts.successful,
                        failed = counts.failed,
                        "task completed"
                    );
                    self.finish(&task, TaskResult::completed(&task, start_ms, end_ms, counts));
                }
                Err(err) if self.retry.should_retry(task.retry_count) => {
                    self.schedule_retry(task, &err);
                }
                Err(err) => {
                    error!(task_id = %task.id, attempt, error = %err, "task failed; retries exhausted");
                    let message = err.to_string();
                    self.finish(&task, TaskResult::failed(&task, start_ms, end_ms, message));
                }
            }

            // Keep the freed slot busy rather than waiting for the next tick.
            self.dispatch_ready();
        })
    }

    /// Race the sync capability against the per-attempt timeout. Panics are
    /// caught and reported as failures so the slot is always released.
    async fn call_sync(&self, task: &Task) -> Result<SyncOutcome, SyncError> {
        let call = AssertUnwindSafe(self.executor.perform_sync(&task.target_ids)).catch_unwind();
        match tokio::time::timeout(self.config.task_timeout(), call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(SyncError::Panicked(panic_message(&*panic))),
            Err(_) => Err(SyncError::Timeout {
                timeout_ms: self.config.task_timeout_ms,
            }),
        }
    }

    /// Record a terminal result and release the slot in one critical section.
    fn finish(&self, task: &Task, result: TaskResult) {
        let action = match result.status {
            TaskStatus::Completed => AuditAction::Completed,
            _ => AuditAction::Failed,
        };
        let detail = result.error.clone();
        let mut state = self.state.lock();
        state.in_flight.remove(&task.id);
        state.results.record(result);
        self.publish_in_flight(&state);
        self.record_audit(task, action, detail);
    }

    /// Park the next copy of `task` in the retry-delay set and re-queue it once
    /// the delay elapses.
    fn schedule_retry(self: &Arc<Self>, task: Task, err: &SyncError) {
        let delay = self.retry.delay_for(task.retry_count);
        let next = task.next_attempt();
        let id = next.id;
        {
            let mut state = self.state.lock();
            state.in_flight.remove(&id);
            self.record_audit(&next, AuditAction::RetryScheduled, Some(err.to_string()));
            state.retrying.insert(id, next);
            self.publish_in_flight(&state);
        }
        warn!(
            task_id = %id,
            attempt = task.retry_count + 1,
            error = %err,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "sync attempt failed; retry scheduled"
        );

        let shared = Arc::clone(self);
        self.spawner.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.requeue(id);
        });
    }

    /// Move a task from the retry-delay set back into the queue. A no-op if it
    /// was cancelled during the delay.
    fn requeue(self: &Arc<Self>, id: TaskId) {
        let requeued = {
            let mut state = self.state.lock();
            match state.retrying.remove(&id) {
                Some(task) => {
                    self.record_audit(&task, AuditAction::Requeued, None);
                    state.queue.insert(task);
                    true
                }
                None => false,
            }
        };
        if requeued {
            debug!(task_id = %id, "retry delay elapsed; task re-queued");
            self.dispatch_ready();
            self.wake.notify_one();
        } else {
            debug!(task_id = %id, "task cancelled during retry delay");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
