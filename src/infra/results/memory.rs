//! In-memory result store.

use std::collections::{HashMap, VecDeque};

use crate::core::{TaskId, TaskResult, TaskStatus};

/// Map from task id to its latest recorded result.
///
/// Unbounded unless constructed with [`InMemoryResultStore::bounded`], in which
/// case the oldest-recorded entry is evicted once the bound is exceeded.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: HashMap<TaskId, TaskResult>,
    order: VecDeque<TaskId>,
    max_entries: Option<usize>,
}

impl InMemoryResultStore {
    /// Create an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `max_entries` results.
    #[must_use]
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    /// Record a result, replacing any earlier one for the same task.
    pub fn record(&mut self, result: TaskResult) {
        let id = result.task_id;
        if self.results.insert(id, result).is_none() {
            self.order.push_back(id);
        }
        if let Some(max) = self.max_entries {
            while self.results.len() > max {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.results.remove(&oldest);
                tracing::debug!(task_id = %oldest, "evicted result from bounded store");
            }
        }
    }

    /// Result for a task, if one was recorded.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&TaskResult> {
        self.results.get(id)
    }

    /// Number of stored results with the given status.
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.values().filter(|r| r.status == status).count()
    }

    /// All stored results, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<TaskResult> {
        self.results.values().cloned().collect()
    }

    /// Number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drop every stored result.
    pub fn clear(&mut self) {
        self.results.clear();
        self.order.clear();
    }
}
