//! CLI argument definitions for Quantum.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Find symbols, optionally narrowed to a market |
//! | `snapshot` | Company profile, quote and headlines for one symbol |
//! | `series` | Chart bars for one symbol and interval |
//! | `watch` | Poll a symbol like the dashboard does until interrupted |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | from config | Per-vendor call timeout |
//!
//! # Examples
//!
//! ```bash
//! quantum search apple --market united-states
//! quantum snapshot AAPL --format json --pretty
//! quantum series TSLA --interval 1h --chronological
//! quantum watch BTC/USD --interval 5min --poll-secs 30
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use quantum_core::{Interval, MarketFilter};

/// Quantum Finance market dashboard in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "quantum",
    author,
    version,
    about = "Stock search, quotes, company profiles, news and charts from multiple vendors"
)]
pub struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-vendor call timeout in milliseconds. Overrides QUANTUM_REQUEST_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search symbols by ticker or name.
    Search(SearchArgs),
    /// Show profile, quote and headlines for a symbol.
    Snapshot(SnapshotArgs),
    /// Show chart bars for a symbol.
    Series(SeriesArgs),
    /// Keep a symbol on screen, refreshing the chart on the polling interval.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    #[arg(long, value_enum, default_value_t = MarketArg::All)]
    pub market: MarketArg,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    pub symbol: String,

    /// Ignore any cached snapshot.
    #[arg(long, default_value_t = false)]
    pub force_refresh: bool,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    pub symbol: String,

    #[arg(long, value_parser = parse_interval, default_value = "1day")]
    pub interval: Interval,

    /// Print bars oldest first, as charted.
    #[arg(long, default_value_t = false)]
    pub chronological: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    pub symbol: String,

    #[arg(long, value_parser = parse_interval, default_value = "1day")]
    pub interval: Interval,

    /// Polling interval in seconds. Overrides QUANTUM_POLL_INTERVAL_SECS.
    #[arg(long)]
    pub poll_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    All,
    /// NASDAQ and NYSE listings.
    UnitedStates,
    Crypto,
}

impl From<MarketArg> for MarketFilter {
    fn from(value: MarketArg) -> Self {
        match value {
            MarketArg::All => Self::All,
            MarketArg::UnitedStates => Self::UnitedStates,
            MarketArg::Crypto => Self::Crypto,
        }
    }
}

fn parse_interval(value: &str) -> Result<Interval, String> {
    value.parse::<Interval>().map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_series_interval() {
        let cli = Cli::try_parse_from(["quantum", "series", "aapl", "--interval", "1h"])
            .expect("arguments should parse");

        match cli.command {
            Command::Series(args) => {
                assert_eq!(args.symbol, "aapl");
                assert_eq!(args.interval, Interval::OneHour);
                assert!(!args.chronological);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_interval() {
        let result = Cli::try_parse_from(["quantum", "series", "AAPL", "--interval", "2h"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "quantum",
            "search",
            "bitcoin",
            "--market",
            "crypto",
            "--format",
            "json",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(MarketFilter::from(args.market), MarketFilter::Crypto)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
