//! In-memory priority queue, FIFO within a priority tier.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::core::{Task, TaskId, TaskQueue};

/// Wrapper to make a `Task` orderable by priority (high first) and insertion
/// sequence within a priority.
struct PriorityTask {
    task: Task,
    seq: u64,
}

impl PartialEq for PriorityTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for PriorityTask {}

impl PartialOrd for PriorityTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // `Priority::High` is the smallest variant; reverse both keys for the max-heap.
        match other.task.priority.cmp(&self.task.priority) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

/// In-memory queue storing pending tasks in a binary heap.
///
/// O(log n) insert and take; O(n) removal by id, which only cancellation uses.
pub struct InMemoryQueue {
    tasks: BinaryHeap<PriorityTask>,
    ids: HashSet<TaskId>,
    next_seq: u64,
}

impl InMemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: BinaryHeap::new(),
            ids: HashSet::new(),
            next_seq: 0,
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue for InMemoryQueue {
    /// Inserting an id that is already queued replaces the earlier entry.
    fn insert(&mut self, task: Task) {
        if self.ids.contains(&task.id) {
            tracing::warn!(task_id = %task.id, "task already queued; replacing");
            self.remove(&task.id);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ids.insert(task.id);
        self.tasks.push(PriorityTask { task, seq });
    }

    fn take_next(&mut self) -> Option<Task> {
        let pt = self.tasks.pop()?;
        self.ids.remove(&pt.task.id);
        Some(pt.task)
    }

    fn remove(&mut self, id: &TaskId) -> Option<Task> {
        if !self.ids.remove(id) {
            return None;
        }
        // Rebuild heap without the removed task
        let (hit, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_vec()
            .into_iter()
            .partition(|pt| pt.task.id == *id);
        self.tasks = keep.into();
        hit.into_iter().next().map(|pt| pt.task)
    }

    fn contains(&self, id: &TaskId) -> bool {
        self.ids.contains(id)
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn snapshot(&self) -> Vec<TaskId> {
        let mut ordered: Vec<&PriorityTask> = self.tasks.iter().collect();
        ordered.sort_by(|a, b| b.cmp(a));
        ordered.into_iter().map(|pt| pt.task.id).collect()
    }
}
