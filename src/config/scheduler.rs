//! Scheduler configuration.

use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, RetryPolicy};

/// Prefix of the environment variables read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "SYNC_SCHEDULER_";

/// Scheduler configuration. Missing fields take their defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum attempts in flight at once.
    pub max_concurrent_tasks: usize,
    /// Per-attempt timeout in milliseconds.
    pub task_timeout_ms: u64,
    /// Delay before a failed attempt is re-queued, in milliseconds.
    pub retry_delay_ms: u64,
    /// Additional attempts allowed after the first.
    pub max_retries: u32,
    /// Dispatcher backstop tick in milliseconds.
    pub poll_interval_ms: u64,
    /// Growth factor applied to the retry delay per retry. `1.0` is constant.
    pub retry_backoff_multiplier: f64,
    /// Reject `add_task` once this many tasks are queued. Retries bypass it.
    pub max_queue_depth: Option<usize>,
    /// Keep at most this many results, evicting the oldest.
    pub max_stored_results: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 5,
            task_timeout_ms: 60_000,
            retry_delay_ms: 5_000,
            max_retries: 3,
            poll_interval_ms: 1_000,
            retry_backoff_multiplier: 1.0,
            max_queue_depth: None,
            max_stored_results: None,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_tasks == 0 {
            return Err("max_concurrent_tasks must be greater than 0".into());
        }
        if self.task_timeout_ms == 0 {
            return Err("task_timeout_ms must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        if !self.retry_backoff_multiplier.is_finite() || self.retry_backoff_multiplier < 1.0 {
            return Err("retry_backoff_multiplier must be a finite value >= 1.0".into());
        }
        if self.max_queue_depth == Some(0) {
            return Err("max_queue_depth must be greater than 0 when set".into());
        }
        if self.max_stored_results == Some(0) {
            return Err("max_stored_results must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a message on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from `SYNC_SCHEDULER_*` environment variables,
    /// reading a `.env` file first if present. Unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but cannot be parsed, or if the result does
    /// not validate.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (full variable names,
    /// including [`ENV_PREFIX`]).
    ///
    /// # Errors
    ///
    /// Same as [`SchedulerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, "MAX_CONCURRENT_TASKS")? {
            cfg.max_concurrent_tasks = v;
        }
        if let Some(v) = parse_var(&lookup, "TASK_TIMEOUT_MS")? {
            cfg.task_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "RETRY_DELAY_MS")? {
            cfg.retry_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "POLL_INTERVAL_MS")? {
            cfg.poll_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "RETRY_BACKOFF_MULTIPLIER")? {
            cfg.retry_backoff_multiplier = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_QUEUE_DEPTH")? {
            cfg.max_queue_depth = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "MAX_STORED_RESULTS")? {
            cfg.max_stored_results = Some(v);
        }
        cfg.validate().map_err(|e| anyhow!(e))?;
        Ok(cfg)
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// Dispatcher backstop tick.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Retry policy derived from this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            multiplier: self.retry_backoff_multiplier,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{ENV_PREFIX}{name}");
    match lookup(&key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid value for {key}: {e}")),
    }
}
