//! Retry policy for GitHub requests.

use std::time::Duration;

use reqwest::StatusCode;

/// Upper bound for any single wait, including server-requested ones.
const MAX_DELAY_SECS: u64 = 60;

/// Exponential backoff for transient GitHub failures.
///
/// Attempt `n` (1-based) waits `base_delay_secs * 2^(n-1)` seconds, capped
/// at one minute.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in seconds.
    pub base_delay_secs: u64,
}

impl RetryStrategy {
    /// Creates a strategy making at most `max_attempts` requests.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 1,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, secs: u64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    /// Backoff delay after the given failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_secs(self.base_delay_secs.saturating_mul(factor).min(MAX_DELAY_SECS))
    }

    /// Delay after a rate-limited response. `Retry-After` wins over backoff.
    pub fn delay_for_retry_after(&self, retry_after: Option<u64>, attempt: u32) -> Duration {
        match retry_after {
            Some(secs) => Duration::from_secs(secs.min(MAX_DELAY_SECS)),
            None => self.delay_for_attempt(attempt),
        }
    }

    /// Connection failures and timeouts are worth another attempt.
    pub fn should_retry(&self, error: &reqwest::Error) -> bool {
        error.is_connect() || error.is_timeout()
    }

    /// Server errors are retried. Rate limits are handled by the client.
    pub fn should_retry_status(&self, status: StatusCode) -> bool {
        status.is_server_error()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}
