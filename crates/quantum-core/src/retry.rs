//! Retry policy applied by the aggregator around individual vendor calls.

use std::time::Duration;

use crate::data_source::{VendorError, VendorErrorKind};
use crate::ValidationError;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor ^ attempt`, capped at `max`, optionally with +/- 50% jitter.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let capped = Self::capped(base, factor, max, attempt);
                if !jitter {
                    return capped;
                }

                let jitter_ms = (capped.as_millis() as f64 * 0.5) as u64;
                let offset = fastrand::u64(0..=(jitter_ms * 2));
                let total_ms = capped.as_millis() as i64 + (offset as i64 - jitter_ms as i64);
                Duration::from_millis(total_ms.max(0) as u64)
            }
        }
    }

    /// Longest delay `delay(attempt)` can return.
    pub fn max_delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let capped = Self::capped(base, factor, max, attempt);
                if jitter {
                    capped.mul_f64(1.5)
                } else {
                    capped
                }
            }
        }
    }

    /// Rejects factors that would shrink or flip the delay between attempts.
    pub fn validate(self) -> Result<(), ValidationError> {
        match self {
            Self::Exponential { factor, .. } if !factor.is_finite() || factor < 1.0 => {
                Err(ValidationError::InvalidBackoff {
                    reason: "exponential factor must be finite and at least 1.0",
                })
            }
            _ => Ok(()),
        }
    }

    fn capped(base: Duration, factor: f64, max: Duration, attempt: u32) -> Duration {
        let seconds = base.as_secs_f64() * factor.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        // NaN folds to zero through max()
        Duration::from_secs_f64(seconds.min(max.as_secs_f64()).max(0.0))
    }
}

/// How often, and for which failures, a vendor call is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_on: Vec<VendorErrorKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Backoff::default(),
            retry_on: vec![VendorErrorKind::Unreachable],
        }
    }
}

impl RetryConfig {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether a failure on attempt `attempt` (0-based) earns another try.
    pub fn should_retry(&self, error: &VendorError, attempt: u32) -> bool {
        attempt < self.max_retries && self.retry_on.contains(&error.kind())
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Upper bound on wall time for one vendor call, all attempts included.
    pub fn worst_case_budget(&self, call_timeout: Duration) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let waiting = (0..self.max_retries)
            .map(|attempt| self.backoff.max_delay(attempt))
            .sum::<Duration>();
        call_timeout.saturating_mul(attempts).saturating_add(waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderId;

    #[test]
    fn default_retries_unreachable_once() {
        let config = RetryConfig::default();
        let timeout = VendorError::unreachable(ProviderId::Yahoo, "timed out");
        let quota = VendorError::rate_limited(ProviderId::Yahoo, "quota");

        assert!(config.should_retry(&timeout, 0));
        assert!(!config.should_retry(&timeout, 1));
        assert!(!config.should_retry(&quota, 0));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn negative_factor_never_yields_a_negative_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: -2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        assert_eq!(backoff.max_delay(1), Duration::ZERO);
        assert_eq!(backoff.delay(1), Duration::ZERO);
        assert!(backoff.validate().is_err());
    }

    #[test]
    fn growing_factor_validates() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 1.5,
            max: Duration::from_secs(1),
            jitter: false,
        };
        assert_eq!(backoff.validate(), Ok(()));
        assert_eq!(Backoff::default().validate(), Ok(()));
    }

    #[test]
    fn jitter_stays_within_half() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(3),
            jitter: true,
        };

        for attempt in 0..4 {
            let delay = backoff.delay(attempt);
            assert!(delay <= backoff.max_delay(attempt), "attempt={attempt}");
        }
    }

    #[test]
    fn budget_counts_every_attempt_and_delay() {
        let config = RetryConfig::default();
        assert_eq!(
            config.worst_case_budget(Duration::from_secs(10)),
            Duration::from_millis(20_500)
        );
        assert_eq!(
            RetryConfig::no_retry().worst_case_budget(Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }
}
