//! Task scheduler handle, shared state, and introspection.
//!
//! [`TaskScheduler`] is a cheaply clonable handle around shared state. The
//! queue, the retry-delay holding set, the in-flight set, and the result store
//! all live behind one `parking_lot::Mutex`, so a task id moves between them
//! atomically and can never be dispatched twice. The lock is never held across
//! an `.await`.
//!
//! ```rust,ignore
//! use sync_scheduler::builders::SchedulerBuilder;
//! use sync_scheduler::core::Priority;
//!
//! let scheduler = SchedulerBuilder::new()
//!     .with_max_concurrent_tasks(2)
//!     .build(my_sync)?;
//! let id = scheduler.add_task(["app-17", "app-18"], Priority::High)?;
//! scheduler.start();
//! // ...
//! scheduler.stop().await;
//! let result = scheduler.get_task_result(&id);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::core::{
    build_audit_event, AuditAction, AuditSink, Priority, RetryPolicy, SchedulerError,
    SyncExecutor, Task, TaskId, TaskQueue, TaskResult, TaskStatus,
};
use crate::infra::{InMemoryQueue, InMemoryResultStore};
use crate::runtime::TokioSpawner;

/// Point-in-time counts. Taken under the state lock, but stale as soon as it
/// is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks waiting in the queue.
    pub pending: usize,
    /// Attempts in flight.
    pub running: usize,
    /// Stored results with status `completed`.
    pub completed: usize,
    /// Stored results with status `failed`.
    pub failed: usize,
    /// Stored results with status `cancelled`.
    pub cancelled: usize,
    /// Tasks waiting out a retry delay before re-entering the queue.
    pub retrying: usize,
}

/// Everything mutated by both the dispatcher and the attempts.
pub(crate) struct SchedulerState<Q> {
    pub(crate) active: bool,
    /// Bumped on every `start`, so a stale dispatcher loop knows to exit.
    pub(crate) generation: u64,
    pub(crate) queue: Q,
    pub(crate) retrying: HashMap<TaskId, Task>,
    pub(crate) in_flight: HashSet<TaskId>,
    pub(crate) results: InMemoryResultStore,
}

pub(crate) struct Shared<E, Q> {
    pub(crate) config: SchedulerConfig,
    pub(crate) retry: RetryPolicy,
    pub(crate) executor: E,
    pub(crate) spawner: TokioSpawner,
    pub(crate) state: Mutex<SchedulerState<Q>>,
    /// Wakes the dispatcher loop before its poll tick.
    pub(crate) wake: Notify,
    /// Publishes the in-flight count; `stop` waits for it to reach zero.
    pub(crate) in_flight_tx: watch::Sender<usize>,
    pub(crate) dispatcher: Mutex<Option<JoinHandle<()>>>,
    pub(crate) audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<E, Q> Shared<E, Q> {
    pub(crate) fn record_audit(&self, task: &Task, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.lock().record(build_audit_event(
                task.id,
                action,
                task.priority,
                task.retry_count,
                detail,
            ));
        }
    }

    /// Must be called with the state lock held, after any in-flight change.
    pub(crate) fn publish_in_flight(&self, state: &SchedulerState<Q>) {
        self.in_flight_tx.send_replace(state.in_flight.len());
    }
}

/// Priority task scheduler with bounded concurrency, per-attempt timeouts and
/// delayed retries.
///
/// Clones share the same queue, workers and results.
pub struct TaskScheduler<E, Q = InMemoryQueue> {
    pub(crate) shared: Arc<Shared<E, Q>>,
}

impl<E, Q> Clone for TaskScheduler<E, Q> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> TaskScheduler<E, InMemoryQueue>
where
    E: SyncExecutor,
{
    /// Build a scheduler on the current tokio runtime with an in-memory queue.
    ///
    /// # Errors
    ///
    /// Fails if `config` is invalid or no runtime is available.
    pub fn new(config: SchedulerConfig, executor: E) -> Result<Self, SchedulerError> {
        crate::builders::SchedulerBuilder::new()
            .with_config(config)
            .build(executor)
    }
}

impl<E, Q> TaskScheduler<E, Q>
where
    E: SyncExecutor,
    Q: TaskQueue + 'static,
{
    pub(crate) fn from_parts(
        config: SchedulerConfig,
        executor: E,
        queue: Q,
        spawner: TokioSpawner,
        audit: Option<Box<dyn AuditSink>>,
    ) -> Self {
        let results = config
            .max_stored_results
            .map_or_else(InMemoryResultStore::new, InMemoryResultStore::bounded);
        let (in_flight_tx, _) = watch::channel(0);
        let shared = Shared {
            retry: config.retry_policy(),
            config,
            executor,
            spawner,
            state: Mutex::new(SchedulerState {
                active: false,
                generation: 0,
                queue,
                retrying: HashMap::new(),
                in_flight: HashSet::new(),
                results,
            }),
            wake: Notify::new(),
            in_flight_tx,
            dispatcher: Mutex::new(None),
            audit: audit.map(Mutex::new),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    /// Submit a task. If the scheduler is running and a slot is free, it is
    /// dispatched immediately.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::EmptyTargets`] when `target_ids` is empty and
    /// [`SchedulerError::QueueFull`] when `max_queue_depth` is reached.
    pub fn add_task<I>(&self, target_ids: I, priority: Priority) -> Result<TaskId, SchedulerError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let target_ids: Vec<String> = target_ids.into_iter().map(Into::into).collect();
        if target_ids.is_empty() {
            return Err(SchedulerError::EmptyTargets);
        }
        let task = Task::new(target_ids, priority);
        let id = task.id;
        {
            let mut state = self.shared.state.lock();
            if let Some(max) = self.shared.config.max_queue_depth {
                if state.queue.len() >= max {
                    warn!(depth = state.queue.len(), "task rejected: queue full");
                    return Err(SchedulerError::QueueFull(max));
                }
            }
            self.shared.record_audit(&task, AuditAction::Submitted, None);
            state.queue.insert(task);
        }
        debug!(task_id = %id, %priority, "task queued");

        self.shared.dispatch_ready();
        self.shared.wake.notify_one();
        Ok(id)
    }

    /// Begin dispatching the backlog and any later submissions.
    ///
    /// Returns `false` (and logs a warning) if the scheduler is already running.
    pub fn start(&self) -> bool {
        let generation = {
            let mut state = self.shared.state.lock();
            if state.active {
                warn!("scheduler already running; start ignored");
                return false;
            }
            state.active = true;
            state.generation += 1;
            state.generation
        };
        // Kick any loop left over from `pause` so it sees the new generation and exits.
        self.shared.wake.notify_waiters();

        let handle = self
            .shared
            .spawner
            .spawn(Shared::run_dispatcher(Arc::downgrade(&self.shared), generation));
        drop(self.shared.dispatcher.lock().replace(handle));
        info!(
            generation,
            max_concurrent_tasks = self.shared.config.max_concurrent_tasks,
            "scheduler started"
        );
        true
    }

    /// Stop dispatching and wait until every in-flight attempt has finished.
    ///
    /// Queued tasks stay queued; tasks waiting out a retry delay re-enter the
    /// queue when their delay elapses but are not dispatched until the next
    /// [`start`](Self::start).
    pub async fn stop(&self) {
        if !self.deactivate() {
            debug!("stop called while scheduler not running");
        }
        let handle = self.shared.dispatcher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("dispatcher loop ended abnormally: {e}");
            }
        }

        let mut in_flight = self.shared.in_flight_tx.subscribe();
        let _ = in_flight.wait_for(|count| *count == 0).await;
        info!("scheduler stopped; in-flight work drained");
    }

    /// Stop dispatching new attempts without waiting for in-flight ones.
    /// [`start`](Self::start) resumes.
    pub fn pause(&self) {
        if self.deactivate() {
            info!("scheduler paused");
        }
    }

    /// Whether the scheduler is currently dispatching.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().active
    }

    fn deactivate(&self) -> bool {
        let was_active = {
            let mut state = self.shared.state.lock();
            std::mem::replace(&mut state.active, false)
        };
        self.shared.wake.notify_one();
        was_active
    }

    /// Current status of a task.
    ///
    /// `None` means the id is not known: it was never submitted, or its result
    /// was removed by [`clear_history`](Self::clear_history) or by eviction.
    #[must_use]
    pub fn get_task_status(&self, id: &TaskId) -> Option<TaskStatus> {
        let state = self.shared.state.lock();
        if state.in_flight.contains(id) {
            return Some(TaskStatus::Running);
        }
        if let Some(result) = state.results.get(id) {
            return Some(result.status);
        }
        if state.queue.contains(id) || state.retrying.contains_key(id) {
            return Some(TaskStatus::Pending);
        }
        None
    }

    /// Stored result for a task.
    #[must_use]
    pub fn get_task_result(&self, id: &TaskId) -> Option<TaskResult> {
        self.shared.state.lock().results.get(id).cloned()
    }

    /// All stored results, in no particular order.
    #[must_use]
    pub fn list_results(&self) -> Vec<TaskResult> {
        self.shared.state.lock().results.all()
    }

    /// Queued task ids in the order they would be dispatched.
    #[must_use]
    pub fn queued_task_ids(&self) -> Vec<TaskId> {
        self.shared.state.lock().queue.snapshot()
    }

    /// Snapshot of queue and result counts.
    #[must_use]
    pub fn get_queue_stats(&self) -> QueueStats {
        let state = self.shared.state.lock();
        QueueStats {
            pending: state.queue.len(),
            running: state.in_flight.len(),
            completed: state.results.count(TaskStatus::Completed),
            failed: state.results.count(TaskStatus::Failed),
            cancelled: state.results.count(TaskStatus::Cancelled),
            retrying: state.retrying.len(),
        }
    }

    /// Cancel a task that has not been dispatched yet.
    ///
    /// Succeeds for queued tasks and tasks waiting out a retry delay. Running
    /// tasks are never interrupted; unknown or finished ids are rejected.
    pub fn cancel_task(&self, id: &TaskId) -> bool {
        let mut state = self.shared.state.lock();
        if state.in_flight.contains(id) {
            drop(state);
            warn!(task_id = %id, "cannot cancel running task");
            return false;
        }
        let task = match state.queue.remove(id) {
            Some(task) => task,
            None => match state.retrying.remove(id) {
                Some(task) => task,
                None => {
                    drop(state);
                    warn!(task_id = %id, "cancel requested for unknown or finished task");
                    return false;
                }
            },
        };
        state.results.record(TaskResult::cancelled(&task));
        self.shared.record_audit(&task, AuditAction::Cancelled, None);
        drop(state);
        info!(task_id = %id, "task cancelled");
        true
    }

    /// Drop every stored result. Queued and running tasks are unaffected.
    pub fn clear_history(&self) {
        let cleared = {
            let mut state = self.shared.state.lock();
            let n = state.results.len();
            state.results.clear();
            n
        };
        info!(cleared, "result history cleared");
    }
}
