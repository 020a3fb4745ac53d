//! Retry policy for connection establishment.
//!
//! # Responsibilities
//! - Decide whether another attempt is allowed
//! - Compute the delay before the next attempt (exponential, capped, jittered)

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// How many times, and how patiently, the pool retries a failing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries until success.
    pub max_attempts: Option<u32>,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Retry until success, no delay. Mostly for tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Give up after `attempts` failures.
    pub fn bounded(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
            ..Self::default()
        }
    }

    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    /// True once `failures` consecutive failures exhaust the budget.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        matches!(self.max_attempts, Some(max) if failures >= max)
    }

    /// Delay before retrying after the `failures`-th failure.
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let exponential_base = 2u64.saturating_pow(failures - 1);
        let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

        // Up to 10% jitter
        let jitter_range = capped_delay / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }

    /// Sleep for [`Self::delay_for`] on the calling thread.
    pub fn pause(&self, failures: u32) {
        let delay = self.delay_for(failures);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_exhausts() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(u32::MAX));
    }

    #[test]
    fn test_bounded_exhausts_at_limit() {
        let policy = RetryPolicy::bounded(3);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
        assert!(policy.is_exhausted(4));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default()
            .with_delays(Duration::from_millis(100), Duration::from_millis(1000));

        assert_eq!(policy.delay_for(0), Duration::ZERO);

        let d1 = policy.delay_for(1).as_millis();
        assert!((100..110).contains(&d1));

        let d2 = policy.delay_for(2).as_millis();
        assert!((200..220).contains(&d2));

        let capped = policy.delay_for(10).as_millis();
        assert!((1000..1100).contains(&capped));
    }

    #[test]
    fn test_immediate_has_no_delay() {
        assert_eq!(RetryPolicy::immediate().delay_for(5), Duration::ZERO);
    }
}
