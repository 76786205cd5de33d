//! Startup configuration.
//!
//! Read once, validated, then handed to [`crate::AggregatorBuilder`]. Nothing
//! downstream consults the process environment.
//!
//! # Environment Variables
//!
//! | Setting | Primary | Fallback | Default |
//! |---------|---------|----------|---------|
//! | Twelve Data key | `QUANTUM_TWELVEDATA_API_KEY` | `TWELVEDATA_API_KEY` | unset |
//! | Alpha Vantage key | `QUANTUM_ALPHAVANTAGE_API_KEY` | `ALPHAVANTAGE_API_KEY` | unset |
//! | RapidAPI (Yahoo) key | `QUANTUM_RAPIDAPI_KEY` | `RAPIDAPI_KEY` | unset |
//! | Snapshot TTL | `QUANTUM_SNAPSHOT_TTL_SECS` | - | 60 |
//! | Vendor call timeout | `QUANTUM_REQUEST_TIMEOUT_MS` | - | 10000 |
//! | Polling interval | `QUANTUM_POLL_INTERVAL_SECS` | - | 60 |
//! | Series length | `QUANTUM_SERIES_OUTPUT_SIZE` | - | 30 |
//! | Headlines shown | `QUANTUM_NEWS_LIMIT` | - | 5 |

use std::env;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryConfig;
use crate::{ValidationError, NEWS_DISPLAY_LIMIT};

/// One credential per vendor; `None` means that vendor always fails `Unauthorized`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub twelvedata: Option<String>,
    pub alphavantage: Option<String>,
    pub rapidapi: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |primary: &str, fallback: &str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        Self {
            twelvedata: read("QUANTUM_TWELVEDATA_API_KEY", "TWELVEDATA_API_KEY"),
            alphavantage: read("QUANTUM_ALPHAVANTAGE_API_KEY", "ALPHAVANTAGE_API_KEY"),
            rapidapi: read("QUANTUM_RAPIDAPI_KEY", "RAPIDAPI_KEY"),
        }
    }
}

impl Debug for ApiKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("twelvedata", &mask(&self.twelvedata))
            .field("alphavantage", &mask(&self.alphavantage))
            .field("rapidapi", &mask(&self.rapidapi))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub keys: ApiKeys,
    pub snapshot_ttl: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub retry: RetryConfig,
    pub series_output_size: usize,
    pub news_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: ApiKeys::default(),
            snapshot_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(60),
            retry: RetryConfig::default(),
            series_output_size: 30,
            news_limit: NEWS_DISPLAY_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        let defaults = Self::default();
        let config = Self {
            keys: ApiKeys::from_lookup(&lookup),
            snapshot_ttl: parse_or(&lookup, "QUANTUM_SNAPSHOT_TTL_SECS")?
                .map_or(defaults.snapshot_ttl, Duration::from_secs),
            request_timeout: parse_or(&lookup, "QUANTUM_REQUEST_TIMEOUT_MS")?
                .map_or(defaults.request_timeout, Duration::from_millis),
            poll_interval: parse_or(&lookup, "QUANTUM_POLL_INTERVAL_SECS")?
                .map_or(defaults.poll_interval, Duration::from_secs),
            retry: defaults.retry,
            series_output_size: parse_or(&lookup, "QUANTUM_SERIES_OUTPUT_SIZE")?
                .unwrap_or(defaults.series_output_size),
            news_limit: parse_or(&lookup, "QUANTUM_NEWS_LIMIT")?.unwrap_or(defaults.news_limit),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn with_keys(mut self, keys: ApiKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.snapshot_ttl.is_zero() {
            return Err(ValidationError::ZeroDuration {
                name: "snapshot_ttl",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::ZeroDuration {
                name: "request_timeout",
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ValidationError::ZeroDuration {
                name: "poll_interval",
            });
        }
        if self.series_output_size == 0 {
            return Err(ValidationError::ZeroOutputSize);
        }
        if self.news_limit == 0 {
            return Err(ValidationError::ZeroNewsLimit);
        }

        self.retry.backoff.validate()?;
        let budget = self.retry.worst_case_budget(self.request_timeout);
        if budget > self.poll_interval {
            return Err(ValidationError::RetryBudgetExceedsPoll {
                budget_ms: budget.as_millis(),
                poll_ms: self.poll_interval.as_millis(),
            });
        }

        Ok(())
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ValidationError> {
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidConfigValue { name, value: raw })
}
