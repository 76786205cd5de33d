//! Vendor client contract and the common error taxonomy.
//!
//! Each role the dashboard needs is a separate trait so a vendor implements
//! only what it actually serves:
//!
//! | Role | Trait | Request | Response |
//! |------|-------|---------|----------|
//! | Quote | [`QuoteSource`] | [`Symbol`] | [`Quote`] |
//! | Profile | [`ProfileSource`] | [`Symbol`] | [`CompanyProfile`] |
//! | News | [`NewsSource`] | [`Symbol`] | `Vec<`[`NewsItem`]`>` |
//! | Time series | [`SeriesSource`] | [`SeriesRequest`] | [`TimeSeries`] |
//! | Search | [`SearchSource`] | [`SearchRequest`] | `Vec<`[`SearchResult`]`>` |
//!
//! Every call issues exactly one outbound request and never retries; retry
//! policy belongs to the aggregator.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::http_client::{HttpError, HttpErrorKind};
use crate::{
    CompanyProfile, Interval, NewsItem, ProviderId, Quote, SearchResult, Symbol, TimeSeries,
    ValidationError,
};

/// Common classification of vendor failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorErrorKind {
    RateLimited,
    Unauthorized,
    NotFound,
    Unreachable,
    MalformedResponse,
}

impl VendorErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Unreachable => "unreachable",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl Display for VendorErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured vendor error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorError {
    kind: VendorErrorKind,
    provider: ProviderId,
    message: String,
}

impl VendorError {
    pub fn new(kind: VendorErrorKind, provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider,
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(VendorErrorKind::RateLimited, provider, message)
    }

    pub fn unauthorized(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(VendorErrorKind::Unauthorized, provider, message)
    }

    pub fn missing_key(provider: ProviderId) -> Self {
        Self::unauthorized(provider, format!("no API key configured for {provider}"))
    }

    pub fn not_found(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(VendorErrorKind::NotFound, provider, message)
    }

    pub fn unreachable(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(VendorErrorKind::Unreachable, provider, message)
    }

    pub fn malformed(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::new(VendorErrorKind::MalformedResponse, provider, message)
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(provider: ProviderId, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => VendorErrorKind::Unauthorized,
            404 => VendorErrorKind::NotFound,
            429 => VendorErrorKind::RateLimited,
            408 | 500..=599 => VendorErrorKind::Unreachable,
            _ => VendorErrorKind::MalformedResponse,
        };

        Self::new(kind, provider, format!("HTTP {status}: {}", message.into()))
    }

    pub fn from_http(provider: ProviderId, error: &HttpError) -> Self {
        let prefix = match error.kind() {
            HttpErrorKind::Timeout => "timed out",
            HttpErrorKind::Connect => "could not connect",
            HttpErrorKind::Body | HttpErrorKind::Other => "transport failure",
        };
        Self::unreachable(provider, format!("{prefix}: {}", error.message()))
    }

    pub const fn kind(&self) -> VendorErrorKind {
        self.kind
    }

    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            VendorErrorKind::RateLimited => "vendor.rate_limited",
            VendorErrorKind::Unauthorized => "vendor.unauthorized",
            VendorErrorKind::NotFound => "vendor.not_found",
            VendorErrorKind::Unreachable => "vendor.unreachable",
            VendorErrorKind::MalformedResponse => "vendor.malformed_response",
        }
    }

    /// Only transport-level failures are worth repeating.
    pub const fn retryable(&self) -> bool {
        matches!(self.kind, VendorErrorKind::Unreachable)
    }
}

impl Display for VendorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.provider, self.kind, self.message)
    }
}

impl std::error::Error for VendorError {}

/// Time series request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub output_size: usize,
}

impl SeriesRequest {
    pub const DEFAULT_OUTPUT_SIZE: usize = 30;

    pub fn new(
        symbol: Symbol,
        interval: Interval,
        output_size: usize,
    ) -> Result<Self, ValidationError> {
        if output_size == 0 {
            return Err(ValidationError::ZeroOutputSize);
        }

        Ok(Self {
            symbol,
            interval,
            output_size,
        })
    }
}

/// Free-text symbol search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
}

impl SearchRequest {
    pub fn new(query: impl AsRef<str>) -> Result<Self, ValidationError> {
        let query = query.as_ref().trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        Ok(Self {
            query: query.to_owned(),
        })
    }
}

/// Boxed future returned by every vendor role.
pub type VendorFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, VendorError>> + Send + 'a>>;

/// Identity shared by all vendor clients.
pub trait Vendor: Send + Sync {
    fn id(&self) -> ProviderId;
}

pub trait QuoteSource: Vendor {
    fn quote<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Quote>;
}

pub trait ProfileSource: Vendor {
    fn profile<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, CompanyProfile>;
}

pub trait NewsSource: Vendor {
    fn news<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Vec<NewsItem>>;
}

pub trait SeriesSource: Vendor {
    fn time_series<'a>(&'a self, request: SeriesRequest) -> VendorFuture<'a, TimeSeries>;
}

pub trait SearchSource: Vendor {
    fn search<'a>(&'a self, request: SearchRequest) -> VendorFuture<'a, Vec<SearchResult>>;
}
