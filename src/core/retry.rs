//! Retry policy: decides whether a failed attempt is retried and after how long.

use std::time::Duration;

/// Retry policy for failed attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor applied per retry already made. `1.0` keeps the delay constant.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Whether a task that has been retried `retry_count` times may try again.
    #[must_use]
    pub const fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Delay before re-queueing a task that has been retried `retry_count` times.
    ///
    /// `base_delay * multiplier^retry_count`, so the first retry waits exactly
    /// `base_delay`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        if self.multiplier <= 1.0 {
            return self.base_delay;
        }
        let exp = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.multiplier.powi(exp);
        if !millis.is_finite() || millis >= u64::MAX as f64 {
            return Duration::MAX;
        }
        Duration::from_millis(millis.round() as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(5_000),
            multiplier: 1.0,
        }
    }
}
