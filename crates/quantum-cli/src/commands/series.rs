use std::process::ExitCode;

use quantum_core::{Aggregator, Notice};

use crate::cli::{Cli, SeriesArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    aggregator: &Aggregator,
    args: &SeriesArgs,
    cli: &Cli,
) -> Result<ExitCode, CliError> {
    let mut series = match aggregator.time_series(&args.symbol, args.interval).await {
        Ok(series) => series,
        Err(error) => {
            output::render_notice(&Notice::for_fetch_failure(&error));
            return Err(error.into());
        }
    };

    if args.chronological {
        series.bars = series.chronological();
    }

    output::render(&series, cli.format, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}
