//! # Quantum Core
//!
//! Market-data aggregation for the Quantum Finance dashboard.
//!
//! ## Overview
//!
//! - **Normalized schema** for company profiles, quotes, news, bars and search hits
//! - **Vendor clients** for Yahoo (RapidAPI), Alpha Vantage and Twelve Data
//! - **Aggregator** that fans out to the vendors, merges partial results and caches snapshots
//! - **Dashboard session** that polls the chart series and publishes display state
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Vendor clients (Yahoo, Alpha Vantage, Twelve Data) |
//! | [`aggregator`] | Snapshot fan-out, time series, search |
//! | [`cache`] | Per-symbol snapshot cache |
//! | [`config`] | API keys and tunables |
//! | [`data_source`] | Vendor role traits and error taxonomy |
//! | [`domain`] | Domain models |
//! | [`error`] | Validation and aggregation errors |
//! | [`http_client`] | HTTP transport seam |
//! | [`notice`] | Transient user notices |
//! | [`provider_policy`] | Vendor request quotas |
//! | [`retry`] | Retry policy |
//! | [`session`] | Polling dashboard session |
//! | [`source`] | Vendor identifiers |
//! | [`throttling`] | Local quota enforcement |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │ DashboardSession │────▶│  watch channel   │──▶ renderer / CLI
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │    Aggregator    │────▶│  SnapshotCache   │
//! └────────┬─────────┘     └──────────────────┘
//!          │ join!
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │  Vendor clients  │────▶│   HttpClient     │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Partial data wins. A vendor failure only blanks the part of the snapshot
//! it was responsible for; [`AggregatorError::Aggregation`] is returned only
//! when every vendor failed.
//!
//! ```rust
//! use quantum_core::{AggregatorError, VendorErrorKind};
//!
//! fn describe(error: &AggregatorError) -> &'static str {
//!     match error {
//!         AggregatorError::InvalidSymbol(_) => "check the ticker",
//!         AggregatorError::Vendor(error) if error.kind() == VendorErrorKind::RateLimited => {
//!             "quota exhausted, try later"
//!         }
//!         _ => "try again",
//!     }
//! }
//! ```

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod notice;
pub mod provider_policy;
pub mod retry;
pub mod session;
pub mod source;
pub mod throttling;

// Vendor clients
pub use adapters::{AlphaVantageAdapter, TwelveDataAdapter, YahooAdapter};

// Aggregation
pub use aggregator::{Aggregator, AggregatorBuilder, SnapshotOptions};

// Caching
pub use cache::{CacheMode, CacheWrite, SnapshotCache};

// Configuration
pub use config::{ApiKeys, Config};

// Vendor contract
pub use data_source::{
    NewsSource, ProfileSource, QuoteSource, SearchRequest, SearchSource, SeriesRequest,
    SeriesSource, Vendor, VendorError, VendorErrorKind, VendorFuture,
};

// Domain models
pub use domain::{
    Bar, CompanyProfile, Field, Interval, MarketFilter, NewsItem, Quote, SearchResult,
    StockSnapshot, Symbol, TimeSeries, Trend, TrendDirection, UtcDateTime, VendorFailure,
    VendorRole, NEWS_DISPLAY_LIMIT,
};

// Error types
pub use error::{AggregationError, AggregatorError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Notices
pub use notice::{Notice, NoticeLevel, NOTICE_LIFETIME};

// Quotas
pub use provider_policy::QuotaPolicy;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Session
pub use session::{DashboardSession, DisplayState, Selection, SessionConfig};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::Throttle;
