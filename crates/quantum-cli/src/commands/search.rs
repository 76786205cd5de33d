use std::process::ExitCode;

use quantum_core::{Aggregator, MarketFilter, Notice};

use crate::cli::{Cli, SearchArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    aggregator: &Aggregator,
    args: &SearchArgs,
    cli: &Cli,
) -> Result<ExitCode, CliError> {
    let outcome = aggregator
        .search(&args.query, MarketFilter::from(args.market))
        .await;

    if let Some(notice) = Notice::for_search(&outcome) {
        output::render_notice(&notice);
    }

    let results = outcome?;
    output::render(results.as_slice(), cli.format, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}
