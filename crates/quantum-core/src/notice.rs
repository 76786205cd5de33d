use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::data_source::VendorErrorKind;
use crate::{AggregatorError, SearchResult};

/// How long a notice stays on screen.
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(4);

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a stock symbol!";
pub const NO_RESULTS_MESSAGE: &str = "No stocks found!";
pub const SEARCH_FAILED_MESSAGE: &str = "Error fetching stocks. Try again!";
pub const SERIES_NOT_FOUND_MESSAGE: &str = "Stock data not found";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch stock data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl Display for NoticeLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn expires_at(&self) -> Instant {
        self.raised_at + NOTICE_LIFETIME
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at()
    }

    /// Notice for a finished search, if the outcome deserves one.
    pub fn for_search(outcome: &Result<Vec<SearchResult>, AggregatorError>) -> Option<Self> {
        match outcome {
            Ok(results) if results.is_empty() => Some(Self::warning(NO_RESULTS_MESSAGE)),
            Ok(_) => None,
            Err(AggregatorError::InvalidQuery(_)) => Some(Self::error(EMPTY_QUERY_MESSAGE)),
            Err(_) => Some(Self::error(SEARCH_FAILED_MESSAGE)),
        }
    }

    /// Notice for a failed chart or snapshot fetch.
    pub fn for_fetch_failure(error: &AggregatorError) -> Self {
        match error {
            AggregatorError::Vendor(error) if error.kind() == VendorErrorKind::NotFound => {
                Self::warning(SERIES_NOT_FOUND_MESSAGE)
            }
            _ => Self::error(FETCH_FAILED_MESSAGE),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::VendorError;
    use crate::{ProviderId, ValidationError};

    #[tokio::test(start_paused = true)]
    async fn expires_after_four_seconds() {
        let notice = Notice::warning(NO_RESULTS_MESSAGE);
        assert!(!notice.is_expired());

        tokio::time::advance(Duration::from_millis(3_999)).await;
        assert!(!notice.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notice.is_expired());
    }

    #[tokio::test]
    async fn search_outcomes_map_to_messages() {
        let empty = Notice::for_search(&Ok(Vec::new())).expect("empty results raise a notice");
        assert_eq!(empty.level, NoticeLevel::Warning);
        assert_eq!(empty.message, NO_RESULTS_MESSAGE);

        let invalid = Notice::for_search(&Err(AggregatorError::InvalidQuery(
            ValidationError::EmptyQuery,
        )))
        .expect("blank input raises a notice");
        assert_eq!(invalid.message, EMPTY_QUERY_MESSAGE);

        let failed = Notice::for_search(&Err(AggregatorError::Vendor(VendorError::unreachable(
            ProviderId::TwelveData,
            "timed out",
        ))))
        .expect("vendor failure raises a notice");
        assert_eq!(failed.level, NoticeLevel::Error);
        assert_eq!(failed.message, SEARCH_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn missing_series_is_a_warning() {
        let error = AggregatorError::Vendor(VendorError::not_found(
            ProviderId::TwelveData,
            "no series",
        ));
        let notice = Notice::for_fetch_failure(&error);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.to_string(), "[warning] Stock data not found");
    }
}
