use serde::{Deserialize, Serialize};

use crate::{Field, Interval, Symbol, UtcDateTime, ValidationError};

/// Company profile as reported by the profile vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: Symbol,
    pub name: Field<String>,
    pub sector: Field<String>,
    pub industry: Field<String>,
    pub market_cap: Field<f64>,
    pub website: Field<String>,
    pub description: Field<String>,
    pub logo_url: Field<String>,
    pub icon_url: Field<String>,
}

impl CompanyProfile {
    /// Profile with every field unavailable.
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            name: Field::Unavailable,
            sector: Field::Unavailable,
            industry: Field::Unavailable,
            market_cap: Field::Unavailable,
            website: Field::Unavailable,
            description: Field::Unavailable,
            logo_url: Field::Unavailable,
            icon_url: Field::Unavailable,
        }
    }
}

/// Market quote and key statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub regular_market_price: Field<f64>,
    pub previous_close: Field<f64>,
    pub day_high: Field<f64>,
    pub day_low: Field<f64>,
    pub year_high: Field<f64>,
    pub year_low: Field<f64>,
    pub pe_ratio: Field<f64>,
    pub dividend_yield: Field<f64>,
    pub dividend_date: Field<UtcDateTime>,
    pub eps: Field<f64>,
    pub market_cap: Field<f64>,
    pub earnings_date: Field<UtcDateTime>,
    pub currency: Field<String>,
}

impl Quote {
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            regular_market_price: Field::Unavailable,
            previous_close: Field::Unavailable,
            day_high: Field::Unavailable,
            day_low: Field::Unavailable,
            year_high: Field::Unavailable,
            year_low: Field::Unavailable,
            pe_ratio: Field::Unavailable,
            dividend_yield: Field::Unavailable,
            dividend_date: Field::Unavailable,
            eps: Field::Unavailable,
            market_cap: Field::Unavailable,
            earnings_date: Field::Unavailable,
            currency: Field::Unavailable,
        }
    }

    /// Day change against the previous close, when both sides are known.
    pub fn change(&self) -> Option<(f64, f64)> {
        let price = *self.regular_market_price.value()?;
        let previous = *self.previous_close.value()?;
        let change = price - previous;
        Some((change, change / previous * 100.0))
    }
}

/// One news headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: Field<String>,
    pub link: Field<String>,
    pub published_at: Field<UtcDateTime>,
}

/// OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Bar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Bars for one symbol at one interval, most recent first as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    pub exchange: Field<String>,
    pub currency: Field<String>,
    pub bars: Vec<Bar>,
}

impl TimeSeries {
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Oldest-first view used for charting.
    pub fn chronological(&self) -> Vec<Bar> {
        let mut bars = self.bars.clone();
        bars.sort_by(|left, right| left.ts.cmp(&right.ts));
        bars
    }

    pub fn trend(&self) -> Option<Trend> {
        let first = self.bars.iter().min_by_key(|bar| bar.ts)?;
        let last = self.bars.iter().max_by_key(|bar| bar.ts)?;
        Some(Trend::between(first.close, last.close))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
}

/// Close-to-close movement over a series window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub first_close: f64,
    pub last_close: f64,
    pub percent_change: f64,
    pub direction: TrendDirection,
}

impl Trend {
    fn between(first_close: f64, last_close: f64) -> Self {
        let percent_change = if first_close == 0.0 {
            0.0
        } else {
            (last_close - first_close) / first_close * 100.0
        };

        Self {
            first_close,
            last_close,
            percent_change,
            direction: if last_close > first_close {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            },
        }
    }
}

/// Symbol search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: Symbol,
    pub name: Field<String>,
    pub exchange: Field<String>,
    pub instrument_type: Field<String>,
    pub country: Field<String>,
    pub currency: Field<String>,
}

/// Market filter applied to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketFilter {
    #[default]
    All,
    UnitedStates,
    Crypto,
}

impl MarketFilter {
    pub fn matches(self, result: &SearchResult) -> bool {
        match self {
            Self::All => true,
            Self::UnitedStates => result
                .exchange
                .value()
                .is_some_and(|exchange| matches!(exchange.as_str(), "NASDAQ" | "NYSE")),
            Self::Crypto => result.instrument_type.value().is_some_and(|kind| {
                kind.eq_ignore_ascii_case("crypto") || kind.eq_ignore_ascii_case("digital currency")
            }),
        }
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }

    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }

    Ok(())
}
