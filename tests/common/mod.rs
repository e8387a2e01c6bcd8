//! Test executors and helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use sync_scheduler::core::{
    AuditAction, AuditEvent, InMemoryAuditSink, SyncError, SyncExecutor, SyncOutcome, TaskId,
};

/// Poll `cond` every 5ms until it holds or `timeout_ms` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout_ms: u64, cond: F) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

pub fn audit_sink() -> Arc<Mutex<InMemoryAuditSink>> {
    Arc::new(Mutex::new(InMemoryAuditSink::new(10_000)))
}

/// Events of one kind for one task, in recording order.
pub fn events_for(
    sink: &Arc<Mutex<InMemoryAuditSink>>,
    id: TaskId,
    action: AuditAction,
) -> Vec<AuditEvent> {
    sink.lock()
        .events()
        .into_iter()
        .filter(|e| e.task_id == id && e.action == action)
        .collect()
}

/// Records the first target of every call in start order, tracks peak
/// concurrency, and succeeds after `delay`.
#[derive(Clone)]
pub struct RecordingSync {
    pub delay: Duration,
    pub started: Arc<Mutex<Vec<String>>>,
    /// `(first target, completions observed at start)`.
    pub started_after: Arc<Mutex<Vec<(String, usize)>>>,
    pub runs: Arc<Mutex<HashMap<String, usize>>>,
    pub active: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
    pub completed: Arc<AtomicUsize>,
}

impl RecordingSync {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: Arc::new(Mutex::new(Vec::new())),
            started_after: Arc::new(Mutex::new(Vec::new())),
            runs: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }
}

#[async_trait]
impl SyncExecutor for RecordingSync {
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        let key = target_ids[0].clone();
        {
            let done = self.completed.load(Ordering::SeqCst);
            self.started.lock().push(key.clone());
            self.started_after.lock().push((key.clone(), done));
            *self.runs.lock().entry(key).or_insert(0) += 1;
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(SyncOutcome {
            successful: target_ids.len() as u64,
            failed: 0,
        })
    }
}

/// Always fails with the configured message.
#[derive(Clone)]
pub struct FailingSync {
    pub message: String,
    pub calls: Arc<AtomicUsize>,
}

impl FailingSync {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncExecutor for FailingSync {
    async fn perform_sync(&self, _target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SyncError::remote(self.message.clone()))
    }
}

/// Never resolves.
#[derive(Clone, Default)]
pub struct HangingSync {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SyncExecutor for HangingSync {
    async fn perform_sync(&self, _target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Blocks every call until the test releases a permit.
#[derive(Clone)]
pub struct GatedSync {
    pub gate: Arc<Semaphore>,
    pub calls: Arc<AtomicUsize>,
}

impl GatedSync {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncExecutor for GatedSync {
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SyncError::remote(e.to_string()))?;
        permit.forget();
        Ok(SyncOutcome {
            successful: target_ids.len() as u64,
            failed: 0,
        })
    }
}

/// Fails the first `failures` calls for each first target, then succeeds.
/// Records start order like [`RecordingSync`].
#[derive(Clone)]
pub struct FlakySync {
    pub failures: usize,
    pub delay: Duration,
    pub seen: Arc<Mutex<HashMap<String, usize>>>,
    pub started: Arc<Mutex<Vec<String>>>,
}

impl FlakySync {
    pub fn new(failures: usize, delay: Duration) -> Self {
        Self {
            failures,
            delay,
            seen: Arc::new(Mutex::new(HashMap::new())),
            started: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SyncExecutor for FlakySync {
    async fn perform_sync(&self, target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        let key = target_ids[0].clone();
        self.started.lock().push(key.clone());
        let call = {
            let mut seen = self.seen.lock();
            let n = seen.entry(key).or_insert(0);
            *n += 1;
            *n
        };
        tokio::time::sleep(self.delay).await;
        if call <= self.failures {
            return Err(SyncError::remote(format!("transient failure {call}")));
        }
        Ok(SyncOutcome {
            successful: 1,
            failed: 0,
        })
    }
}

/// Panics on every call.
#[derive(Clone, Default)]
pub struct PanickingSync;

#[async_trait]
impl SyncExecutor for PanickingSync {
    async fn perform_sync(&self, _target_ids: &[String]) -> Result<SyncOutcome, SyncError> {
        panic!("sync exploded");
    }
}
