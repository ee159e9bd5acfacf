use std::time::Duration;

use crate::models::ActionCategory;

/// Reference delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
/// Reference ceiling for the backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);
/// Reference retry cap.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt. `None` retries forever and
    /// has to be asked for explicitly.
    pub max_retries: Option<u32>,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: Option<u32>, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`:
    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether an action that has failed `retry_count` times gets another
    /// attempt.
    pub fn allows_retry(&self, retry_count: u32) -> bool {
        match self.max_retries {
            Some(max) => retry_count <= max,
            None => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Some(DEFAULT_MAX_RETRIES),
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
        )
    }
}

/// Per-category transport timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTimeouts {
    pub small: Duration,
    pub large: Duration,
}

impl CategoryTimeouts {
    pub fn for_category(&self, category: ActionCategory) -> Duration {
        match category {
            ActionCategory::Small => self.small,
            ActionCategory::Large => self.large,
        }
    }
}

impl Default for CategoryTimeouts {
    fn default() -> Self {
        Self {
            small: Duration::from_millis(2000),
            large: Duration::from_millis(5000),
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    pub timeouts: CategoryTimeouts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_delays() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..7)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn test_delays_are_monotone_and_saturate() {
        let policy = RetryPolicy::new(
            None,
            Duration::from_millis(250),
            Duration::from_secs(10),
        );
        let mut previous = Duration::ZERO;
        for n in 0..200 {
            let delay = policy.delay_for(n);
            assert!(delay >= previous, "delay dropped at attempt {n}");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
        assert_eq!(previous, policy.max_delay);
    }

    #[test]
    fn test_huge_exponent_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), DEFAULT_MAX_DELAY);
    }

    #[test]
    fn test_allows_retry_with_cap() {
        let policy = RetryPolicy {
            max_retries: Some(2),
            ..RetryPolicy::default()
        };
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn test_unbounded_policy() {
        let policy = RetryPolicy {
            max_retries: None,
            ..RetryPolicy::default()
        };
        assert!(policy.allows_retry(u32::MAX));
    }

    #[test]
    fn test_category_timeouts() {
        let timeouts = CategoryTimeouts::default();
        assert_eq!(
            timeouts.for_category(ActionCategory::Small),
            Duration::from_millis(2000)
        );
        assert_eq!(
            timeouts.for_category(ActionCategory::Large),
            Duration::from_millis(5000)
        );
    }
}
