use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::data_source::{VendorError, VendorErrorKind};
use crate::source::ProviderId;
use crate::{CompanyProfile, NewsItem, Quote, Symbol, UtcDateTime};

/// Number of headlines the dashboard renders unless configured otherwise.
pub const NEWS_DISPLAY_LIMIT: usize = 5;

const fn default_headline_limit() -> usize {
    NEWS_DISPLAY_LIMIT
}

/// Role a vendor plays for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorRole {
    Quote,
    Profile,
    News,
    TimeSeries,
    Search,
}

impl VendorRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Profile => "profile",
            Self::News => "news",
            Self::TimeSeries => "time_series",
            Self::Search => "search",
        }
    }
}

impl Display for VendorRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vendor call that failed while a snapshot was assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFailure {
    pub role: VendorRole,
    pub provider: ProviderId,
    pub kind: VendorErrorKind,
    pub message: String,
}

impl VendorFailure {
    pub fn new(role: VendorRole, error: &VendorError) -> Self {
        Self {
            role,
            provider: error.provider(),
            kind: error.kind(),
            message: error.message().to_owned(),
        }
    }
}

/// Merged view of profile, quote and news for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: Symbol,
    pub profile: Option<CompanyProfile>,
    pub quote: Option<Quote>,
    pub news: Vec<NewsItem>,
    pub fetched_at: UtcDateTime,
    pub failures: Vec<VendorFailure>,
    /// Issue-order token of the request that produced this snapshot.
    pub generation: u64,
    /// How many of `news` are presented as headlines.
    #[serde(skip, default = "default_headline_limit")]
    pub headline_limit: usize,
}

impl StockSnapshot {
    pub fn headline_news(&self) -> &[NewsItem] {
        let end = self.news.len().min(self.headline_limit);
        &self.news[..end]
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failure_for(&self, role: VendorRole) -> Option<&VendorFailure> {
        self.failures.iter().find(|failure| failure.role == role)
    }
}
