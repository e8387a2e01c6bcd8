//! Queue abstraction for pending tasks.

use super::{Task, TaskId};

/// Ordered collection of pending tasks.
///
/// Implementations must dequeue in priority order (`High` first) and FIFO by
/// insertion within a tier. A re-inserted task goes behind every task of its
/// tier already resident, regardless of its creation time.
pub trait TaskQueue: Send {
    /// Insert a task behind all resident tasks of equal or higher priority.
    fn insert(&mut self, task: Task);
    /// Remove and return the head of the queue.
    fn take_next(&mut self) -> Option<Task>;
    /// Remove a resident task by id. `None` if it is not queued.
    fn remove(&mut self, id: &TaskId) -> Option<Task>;
    /// Whether the task is currently queued.
    fn contains(&self, id: &TaskId) -> bool;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether the queue is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Queued ids in dequeue order.
    fn snapshot(&self) -> Vec<TaskId>;
}
