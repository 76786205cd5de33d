use std::fmt::{self, Display, Formatter};

use quantum_core::{
    Bar, DisplayState, Field, Interval, Notice, NoticeLevel, Quote, SearchResult, StockSnapshot,
    Symbol, TimeSeries, UtcDateTime,
};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Table rendering for command payloads.
pub trait TableView {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result;
}

/// Displays any [`TableView`] as its table.
pub struct Table<'a, T: ?Sized>(pub &'a T);

impl<T: TableView + ?Sized> Display for Table<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.write_table(f)
    }
}

pub fn render<T>(value: &T, format: OutputFormat, pretty: bool) -> Result<(), CliError>
where
    T: Serialize + TableView + ?Sized,
{
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", Table(value)),
    }

    Ok(())
}

/// Notices go to stderr so JSON on stdout stays parseable.
pub fn render_notice(notice: &Notice) {
    eprintln!("{notice}");
}

impl TableView for [SearchResult] {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:<36} {:<10} {:<18} {}",
            "symbol", "name", "exchange", "type", "country"
        )?;
        for result in self {
            writeln!(
                f,
                "{:<12} {:<36} {:<10} {:<18} {}",
                result.symbol.as_str(),
                truncate(&result.name.to_string(), 36),
                result.exchange.to_string(),
                result.instrument_type.to_string(),
                result.country,
            )?;
        }
        Ok(())
    }
}

impl TableView for StockSnapshot {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "symbol      : {}", self.symbol)?;
        writeln!(f, "fetched_at  : {}", self.fetched_at)?;

        match &self.profile {
            Some(profile) => {
                writeln!(f, "name        : {}", profile.name)?;
                writeln!(f, "sector      : {}", profile.sector)?;
                writeln!(f, "industry    : {}", profile.industry)?;
                writeln!(f, "website     : {}", profile.website)?;
                writeln!(f, "market_cap  : {}", compact(&profile.market_cap))?;
            }
            None => writeln!(f, "profile     : N/A")?,
        }

        match &self.quote {
            Some(quote) => write_quote(f, quote)?,
            None => writeln!(f, "quote       : N/A")?,
        }

        let headlines = self.headline_news();
        if headlines.is_empty() {
            writeln!(f, "news        : none")?;
        } else {
            writeln!(f, "news        :")?;
            for item in headlines {
                let date = item.published_at.render(|ts| ts.date_string());
                writeln!(f, "  {date}  {}", item.title)?;
                if let Field::Value(link) = &item.link {
                    writeln!(f, "              {link}")?;
                }
            }
        }

        for failure in &self.failures {
            writeln!(
                f,
                "unavailable : {} via {} ({})",
                failure.role,
                failure.provider.display_name(),
                failure.kind
            )?;
        }
        Ok(())
    }
}

impl TableView for TimeSeries {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "symbol      : {}", self.symbol)?;
        writeln!(f, "interval    : {}", self.interval.label())?;
        writeln!(f, "exchange    : {}", self.exchange)?;
        writeln!(f, "currency    : {}", self.currency)?;
        if let Some(trend) = self.trend() {
            writeln!(
                f,
                "trend       : {:+.2}% ({:?})",
                trend.percent_change, trend.direction
            )?;
        }
        writeln!(f)?;
        write_bars(f, self.interval, &self.bars)
    }
}

/// One published dashboard state, as printed by `watch`.
#[derive(Debug, Serialize)]
pub struct WatchFrame<'a> {
    pub symbol: &'a Symbol,
    pub interval: Interval,
    pub generation: u64,
    pub loading: bool,
    pub snapshot_loading: bool,
    pub snapshot: Option<&'a StockSnapshot>,
    pub series: Option<&'a TimeSeries>,
    pub last_updated: Option<UtcDateTime>,
    pub notice: Option<NoticeFrame<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NoticeFrame<'a> {
    pub level: NoticeLevel,
    pub message: &'a str,
}

impl<'a> WatchFrame<'a> {
    pub fn new(state: &'a DisplayState) -> Self {
        Self {
            symbol: &state.selection.symbol,
            interval: state.selection.interval,
            generation: state.generation,
            loading: state.loading,
            snapshot_loading: state.snapshot_loading,
            snapshot: state.snapshot.as_deref(),
            series: state.series.as_deref(),
            last_updated: state.last_updated,
            notice: state.active_notice().map(|notice| NoticeFrame {
                level: notice.level,
                message: &notice.message,
            }),
        }
    }
}

impl TableView for WatchFrame<'_> {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let updated = self
            .last_updated
            .map_or_else(|| String::from("never"), |ts| ts.to_string());
        writeln!(
            f,
            "== {} {} (generation {}) updated {updated}",
            self.symbol,
            self.interval.label(),
            self.generation
        )?;

        if self.snapshot_loading {
            writeln!(f, "snapshot    : loading")?;
        } else if let Some(quote) = self.snapshot.and_then(|snapshot| snapshot.quote.as_ref()) {
            write_quote(f, quote)?;
        }

        match &self.series {
            Some(series) => {
                if let Some(bar) = series.latest() {
                    let at = bar_time(series.interval, bar);
                    writeln!(f, "last close  : {:.2} at {at}", bar.close)?;
                }
                if let Some(trend) = series.trend() {
                    writeln!(f, "trend       : {:+.2}%", trend.percent_change)?;
                }
            }
            None if self.loading => writeln!(f, "series      : loading")?,
            None => writeln!(f, "series      : N/A")?,
        }

        if let Some(notice) = &self.notice {
            writeln!(f, "[{}] {}", notice.level, notice.message)?;
        }
        Ok(())
    }
}

fn write_quote(f: &mut Formatter<'_>, quote: &Quote) -> fmt::Result {
    writeln!(f, "price       : {}", price(&quote.regular_market_price))?;
    if let Some((change, percent)) = quote.change() {
        writeln!(f, "change      : {change:+.2} ({percent:+.2}%)")?;
    }
    writeln!(f, "prev_close  : {}", price(&quote.previous_close))?;
    writeln!(
        f,
        "day_range   : {} - {}",
        price(&quote.day_low),
        price(&quote.day_high)
    )?;
    writeln!(
        f,
        "52w_range   : {} - {}",
        price(&quote.year_low),
        price(&quote.year_high)
    )?;
    writeln!(f, "pe_ratio    : {}", price(&quote.pe_ratio))?;
    writeln!(f, "eps         : {}", price(&quote.eps))?;
    writeln!(
        f,
        "div_yield   : {}",
        quote.dividend_yield.render(|value| format!("{value:.2}%"))
    )?;
    writeln!(
        f,
        "div_date    : {}",
        quote.dividend_date.render(|ts| ts.date_string())
    )?;
    writeln!(
        f,
        "earnings    : {}",
        quote.earnings_date.render(|ts| ts.date_string())
    )
}

fn write_bars(f: &mut Formatter<'_>, interval: Interval, bars: &[Bar]) -> fmt::Result {
    writeln!(
        f,
        "{:<25} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "ts", "open", "high", "low", "close", "volume"
    )?;
    for bar in bars {
        let volume = bar
            .volume
            .map_or_else(|| String::from("N/A"), |volume| volume.to_string());
        writeln!(
            f,
            "{:<25} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
            bar_time(interval, bar),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            volume
        )?;
    }
    Ok(())
}

/// Daily and longer bars show the date only.
fn bar_time(interval: Interval, bar: &Bar) -> String {
    if interval.is_intraday() {
        bar.ts.to_string()
    } else {
        bar.ts.date_string()
    }
}

fn price(value: &Field<f64>) -> String {
    value.render(|value| format!("{value:.2}"))
}

/// 2.87e12 renders as 2.87T.
fn compact(value: &Field<f64>) -> String {
    value.render(|value| {
        let value = *value;
        let (scaled, suffix) = if value >= 1e12 {
            (value / 1e12, "T")
        } else if value >= 1e9 {
            (value / 1e9, "B")
        } else if value >= 1e6 {
            (value / 1e6, "M")
        } else {
            (value, "")
        };
        format!("{scaled:.2}{suffix}")
    })
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_owned();
    }
    let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
