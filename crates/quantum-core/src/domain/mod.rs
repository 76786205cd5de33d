//! # Domain Models
//!
//! Normalized types shared by every vendor client.
//!
//! Vendor payloads are translated field-by-field into these records. Any
//! value a vendor omits, blanks out, reports as `"None"`/`"-"` or as zero is
//! carried as [`Field::Unavailable`] instead of failing the call.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercased ticker |
//! | [`Interval`] | Chart granularity (`1min` .. `1month`) |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`Field`] | Value or explicit "unavailable" marker |
//! | [`CompanyProfile`] | Name, sector, industry, market cap, website |
//! | [`Quote`] | Price, previous close, ranges, P/E, dividend, EPS |
//! | [`NewsItem`] | Headline, link, publish time |
//! | [`TimeSeries`] | OHLCV bars, newest first |
//! | [`StockSnapshot`] | Merged profile/quote/news for one symbol |
//! | [`SearchResult`] | Symbol search hit |

mod field;
mod interval;
mod models;
mod snapshot;
mod symbol;
mod timestamp;

pub use field::Field;
pub use interval::Interval;
pub use models::{
    Bar, CompanyProfile, MarketFilter, NewsItem, Quote, SearchResult, TimeSeries, Trend,
    TrendDirection,
};
pub use snapshot::{StockSnapshot, VendorFailure, VendorRole, NEWS_DISPLAY_LIMIT};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
