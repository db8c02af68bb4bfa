//! Exponential backoff policy for network retry recovery.

use std::time::Duration;

/// Configuration for retry backoff behavior.
///
/// The delay before retry number `n` (zero-based) is
/// `base_delay * 2^n`, capped at `max_delay`. Defaults produce the
/// 1s, 2s, 4s ladder with at most three retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied to every computed delay.
    pub max_delay: Duration,
    /// Number of retries allowed before recovery reports terminal failure.
    pub max_retries: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with the given parameters.
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u64) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
        }
    }

    /// Computes the delay before retry number `retry_count` (zero-based).
    pub fn delay_for(&self, retry_count: u64) -> Duration {
        let exponent = retry_count.min(31) as u32;
        let multiplier = 1u64 << exponent;
        let millis = (self.base_delay.as_millis() as u64).saturating_mul(multiplier);
        Duration::from_millis(millis.min(self.max_delay.as_millis() as u64))
    }

    /// Whether another retry is allowed at `retry_count` attempts so far.
    pub fn allows_retry(&self, retry_count: u64) -> bool {
        retry_count < self.max_retries
    }
}
