//! Retry policy for idempotent Streamlabs requests

use std::time::Duration;

/// Statuses worth retrying: rate limiting and transient gateway failures
pub const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Exponential backoff policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay, doubled on every further retry
    pub backoff_factor: Duration,
    pub retry_statuses: &'static [u16],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_millis(300),
            retry_statuses: RETRY_STATUSES,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    pub fn should_retry_error(&self, err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout()
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exp)
    }
}
