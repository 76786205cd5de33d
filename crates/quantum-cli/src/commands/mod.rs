mod search;
mod series;
mod snapshot;
mod watch;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use quantum_core::{Aggregator, AggregatorBuilder, Config};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let mut config = Config::from_env().map_err(CliError::Config)?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout = Duration::from_millis(timeout_ms);
    }
    if let Command::Watch(args) = &cli.command {
        if let Some(poll_secs) = args.poll_secs {
            config.poll_interval = Duration::from_secs(poll_secs);
        }
    }
    debug!(?config, "resolved configuration");

    let aggregator = build_aggregator(config)?;

    match &cli.command {
        Command::Search(args) => search::run(&aggregator, args, cli).await,
        Command::Snapshot(args) => snapshot::run(&aggregator, args, cli).await,
        Command::Series(args) => series::run(&aggregator, args, cli).await,
        Command::Watch(args) => watch::run(aggregator, args, cli).await,
    }
}

fn build_aggregator(config: Config) -> Result<Arc<Aggregator>, CliError> {
    AggregatorBuilder::new(config)
        .build()
        .map(Arc::new)
        .map_err(CliError::Config)
}
