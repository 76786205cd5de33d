use thiserror::Error;

use crate::data_source::VendorError;
use crate::domain::{Symbol, VendorFailure};

/// Validation and contract errors exposed by `quantum-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error(
        "invalid interval '{value}', expected one of 1min, 5min, 15min, 30min, 1h, 1day, 1week, 1month"
    )]
    InvalidInterval { value: String },

    #[error("search query cannot be empty")]
    EmptyQuery,
    #[error("series output size must be greater than zero")]
    ZeroOutputSize,
    #[error("news limit must be greater than zero")]
    ZeroNewsLimit,

    #[error("timestamp could not be parsed: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,

    #[error("configuration value '{name}' is invalid: '{value}'")]
    InvalidConfigValue { name: &'static str, value: String },
    #[error("configuration value '{name}' must be greater than zero")]
    ZeroDuration { name: &'static str },
    #[error("invalid retry backoff: {reason}")]
    InvalidBackoff { reason: &'static str },
    #[error("worst-case retry budget of {budget_ms}ms exceeds the {poll_ms}ms polling interval")]
    RetryBudgetExceedsPoll { budget_ms: u128, poll_ms: u128 },
}

/// Every vendor consulted for a snapshot failed; no partial data exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("all vendors failed for {symbol}: {}", describe_failures(.failures))]
pub struct AggregationError {
    pub symbol: Symbol,
    pub failures: Vec<VendorFailure>,
}

fn describe_failures(failures: &[VendorFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{}={}", failure.role, failure.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error surface of the public aggregator operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(ValidationError),

    #[error("invalid query: {0}")]
    InvalidQuery(ValidationError),

    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl AggregatorError {
    /// Stable machine-readable code used by the CLI output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "aggregator.invalid_symbol",
            Self::InvalidQuery(_) => "aggregator.invalid_query",
            Self::Vendor(error) => error.code(),
            Self::Aggregation(_) => "aggregator.all_vendors_failed",
        }
    }
}
