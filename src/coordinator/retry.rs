//! Exponential backoff for failed page fetches.

use std::time::Duration;

use shelf_search::SearchError;

/// How often and how patiently a failed fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`: `base_delay × 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether a fetch that has already been retried `attempt` times and
    /// just failed with `error` should be tried again.
    pub fn should_retry(&self, attempt: u32, error: &SearchError) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}
