//! Retry policy for upstream fetches.
//!
//! Backoff is a pure function of the attempt number so it can be tested
//! without sleeping. The importer owns the loop and the sleeping.

use std::time::Duration;

/// Default number of attempts (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default ceiling on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped at `max`.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(20));
    base.saturating_mul(factor).min(max)
}

/// How often and how patiently to retry a failing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries once and never waits.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt `attempt` (0-based), or `None` if
    /// that was the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts.max(1) {
            None
        } else {
            Some(backoff_delay(attempt, self.base_delay, self.max_delay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(2);
        assert_eq!(backoff_delay(0, base, max), Duration::from_millis(100));
        assert_eq!(backoff_delay(1, base, max), Duration::from_millis(200));
        assert_eq!(backoff_delay(3, base, max), Duration::from_millis(800));
        assert_eq!(backoff_delay(5, base, max), max); // 3.2s > 2s
        assert_eq!(backoff_delay(u32::MAX, base, max), max);
    }

    #[test]
    fn test_backoff_is_monotonic() {
        let base = Duration::from_millis(250);
        let mut previous = Duration::ZERO;
        for attempt in 0..40 {
            let delay = backoff_delay(attempt, base, DEFAULT_MAX_DELAY);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_delay_after_respects_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(0), Some(Duration::from_millis(10)));
        assert_eq!(policy.delay_after(1), Some(Duration::from_millis(20)));
        assert_eq!(policy.delay_after(2), None);
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryPolicy::no_retry().delay_after(0), None);
    }

    #[test]
    fn test_zero_attempts_behaves_like_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(0), None);
    }
}
