//! Dispatcher: moves queued tasks into free execution slots.

use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::core::scheduler::Shared;
use crate::core::{AuditAction, SyncExecutor, Task, TaskQueue};

impl<E, Q> Shared<E, Q>
where
    E: SyncExecutor,
    Q: TaskQueue + 'static,
{
    /// Dispatch queued tasks until the queue is empty or every slot is taken.
    ///
    /// Dequeue and in-flight insertion happen in one critical section, and the
    /// active flag is checked inside it, so nothing starts once `stop` or
    /// `pause` has cleared the flag. Returns the number of attempts spawned.
    pub(crate) fn dispatch_ready(self: &Arc<Self>) -> usize {
        let batch: Vec<Task> = {
            let mut state = self.state.lock();
            if !state.active {
                return 0;
            }
            let mut batch = Vec::new();
            while state.in_flight.len() < self.config.max_concurrent_tasks {
                let Some(task) = state.queue.take_next() else {
                    break;
                };
                state.in_flight.insert(task.id);
                self.record_audit(&task, AuditAction::Started, None);
                batch.push(task);
            }
            if !batch.is_empty() {
                self.publish_in_flight(&state);
            }
            batch
        };

        let dispatched = batch.len();
        for task in batch {
            debug!(
                task_id = %task.id,
                priority = %task.priority,
                attempt = task.retry_count + 1,
                "dispatching task"
            );
            self.spawner.spawn(Arc::clone(self).run_attempt(task));
        }
        dispatched
    }

    /// Control loop: dispatch, then sleep until woken or the poll tick fires.
    ///
    /// Holds only a weak reference between iterations so that dropping every
    /// scheduler handle ends the loop.
    pub(crate) async fn run_dispatcher(shared: Weak<Self>, generation: u64) {
        debug!(generation, "dispatcher loop running");
        loop {
            let Some(shared) = shared.upgrade() else {
                debug!(generation, "scheduler dropped; dispatcher loop exiting");
                break;
            };
            {
                let state = shared.state.lock();
                if !state.active || state.generation != generation {
                    break;
                }
            }
            let dispatched = shared.dispatch_ready();
            trace!(generation, dispatched, "dispatcher tick");

            let poll = shared.config.poll_interval();
            let _ = tokio::time::timeout(poll, shared.wake.notified()).await;
        }
        debug!(generation, "dispatcher loop exited");
    }
}
