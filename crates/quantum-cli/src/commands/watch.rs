use std::process::ExitCode;
use std::sync::Arc;

use quantum_core::{Aggregator, DashboardSession, Selection, SessionConfig};
use tracing::info;

use crate::cli::{Cli, WatchArgs};
use crate::error::CliError;
use crate::output::{self, WatchFrame};

/// Print every published dashboard state until Ctrl-C.
pub async fn run(
    aggregator: Arc<Aggregator>,
    args: &WatchArgs,
    cli: &Cli,
) -> Result<ExitCode, CliError> {
    let selection = Selection::new(&args.symbol, args.interval)?;
    let config = SessionConfig::from_config(aggregator.config());
    info!(
        symbol = %selection.symbol,
        interval = %selection.interval,
        poll_secs = config.poll_interval.as_secs(),
        "watching"
    );

    let mut session = DashboardSession::start(aggregator, selection, config);
    let mut updates = session.subscribe();

    loop {
        {
            let state = updates.borrow_and_update();
            output::render(&WatchFrame::new(&state), cli.format, cli.pretty)?;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    session.stop();
    Ok(ExitCode::SUCCESS)
}
