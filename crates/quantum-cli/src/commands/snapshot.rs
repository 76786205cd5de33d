use std::process::ExitCode;

use quantum_core::{Aggregator, SnapshotOptions};

use crate::cli::{Cli, SnapshotArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    aggregator: &Aggregator,
    args: &SnapshotArgs,
    cli: &Cli,
) -> Result<ExitCode, CliError> {
    let options = if args.force_refresh {
        SnapshotOptions::force_refresh()
    } else {
        SnapshotOptions::default()
    };

    let snapshot = aggregator.snapshot(&args.symbol, options).await?;
    output::render(snapshot.as_ref(), cli.format, cli.pretty)?;

    // partial data still renders, but scripts can tell it apart
    if snapshot.is_partial() {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
