//! Polling dashboard state for one selected symbol and interval.
//!
//! A [`DashboardSession`] owns a background task that loads the snapshot once
//! per symbol and refreshes the chart series on a fixed interval. Results are
//! published through a `tokio::sync::watch` channel as [`DisplayState`].
//!
//! Changing the selection aborts the task and starts a new one under a new
//! generation. Every write is checked against the current generation, so a
//! response that lands after the switch is dropped instead of displayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, SnapshotOptions};
use crate::config::Config;
use crate::notice::Notice;
use crate::{Interval, StockSnapshot, Symbol, TimeSeries, UtcDateTime, ValidationError};

/// Symbol and chart interval currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub symbol: Symbol,
    pub interval: Interval,
}

impl Selection {
    pub fn new(symbol: &str, interval: Interval) -> Result<Self, ValidationError> {
        Ok(Self {
            symbol: Symbol::parse(symbol)?,
            interval,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Everything a renderer needs for the dashboard.
#[derive(Debug, Clone)]
pub struct DisplayState {
    pub selection: Selection,
    pub generation: u64,
    /// True until the first series result for this selection arrives.
    pub loading: bool,
    pub series: Option<Arc<TimeSeries>>,
    pub snapshot_loading: bool,
    pub snapshot: Option<Arc<StockSnapshot>>,
    /// When the displayed series was last refreshed.
    pub last_updated: Option<UtcDateTime>,
    pub notice: Option<Notice>,
}

impl DisplayState {
    fn initial(selection: Selection, generation: u64) -> Self {
        Self {
            selection,
            generation,
            loading: true,
            series: None,
            snapshot_loading: true,
            snapshot: None,
            last_updated: None,
            notice: None,
        }
    }

    /// The notice, unless its display lifetime has passed.
    pub fn active_notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| !notice.is_expired())
    }
}

pub struct DashboardSession {
    aggregator: Arc<Aggregator>,
    config: SessionConfig,
    state: Arc<watch::Sender<DisplayState>>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl DashboardSession {
    /// Start polling `selection` immediately.
    pub fn start(aggregator: Arc<Aggregator>, selection: Selection, config: SessionConfig) -> Self {
        let generation = 1;
        let (state, _) = watch::channel(DisplayState::initial(selection.clone(), generation));

        let mut session = Self {
            aggregator,
            config,
            state: Arc::new(state),
            generation,
            task: None,
        };
        session.spawn(selection, true);
        session
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch to a new symbol and/or interval.
    ///
    /// A symbol change clears the displayed data and evicts the previous
    /// symbol's cached snapshot; an interval change keeps the snapshot.
    pub async fn select(
        &mut self,
        symbol: &str,
        interval: Interval,
    ) -> Result<(), ValidationError> {
        let selection = Selection::new(symbol, interval)?;
        let previous = self.state.borrow().selection.clone();
        if previous == selection && self.task.is_some() {
            return Ok(());
        }

        self.abort_task();
        self.generation += 1;
        let generation = self.generation;
        let symbol_changed = previous.symbol != selection.symbol;

        if symbol_changed {
            self.aggregator.evict(&previous.symbol).await;
        }

        info!(
            from = %previous.symbol,
            to = %selection.symbol,
            interval = %selection.interval,
            generation,
            "selection changed"
        );

        let next = selection.clone();
        self.state.send_modify(|state| {
            state.selection = next;
            state.generation = generation;
            state.loading = true;
            state.series = None;
            state.last_updated = None;
            if symbol_changed {
                state.snapshot = None;
                state.snapshot_loading = true;
                state.notice = None;
            }
        });

        let fetch_snapshot = symbol_changed || self.state.borrow().snapshot.is_none();
        self.spawn(selection, fetch_snapshot);
        Ok(())
    }

    pub async fn set_interval(&mut self, interval: Interval) -> Result<(), ValidationError> {
        let symbol = self.state.borrow().selection.symbol.clone();
        self.select(symbol.as_str(), interval).await
    }

    /// Stop polling. The last published state stays readable.
    pub fn stop(&mut self) {
        self.abort_task();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn spawn(&mut self, selection: Selection, fetch_snapshot: bool) {
        let task = tokio::spawn(poll(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.state),
            selection,
            self.generation,
            self.config.poll_interval,
            fetch_snapshot,
        ));
        self.task = Some(task);
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn poll(
    aggregator: Arc<Aggregator>,
    state: Arc<watch::Sender<DisplayState>>,
    selection: Selection,
    generation: u64,
    poll_interval: Duration,
    fetch_snapshot: bool,
) {
    let snapshot = async {
        if !fetch_snapshot {
            return;
        }

        let outcome = aggregator
            .snapshot(selection.symbol.as_str(), SnapshotOptions::default())
            .await;
        publish(&state, generation, |current| {
            current.snapshot_loading = false;
            match outcome {
                Ok(snapshot) => current.snapshot = Some(snapshot),
                Err(error) => {
                    warn!(
                        symbol = %selection.symbol,
                        code = error.code(),
                        "snapshot refresh failed: {error}"
                    );
                    current.notice = Some(Notice::for_fetch_failure(&error));
                }
            }
        });
    };

    let series = async {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let outcome = aggregator
                .time_series(selection.symbol.as_str(), selection.interval)
                .await;

            publish(&state, generation, |current| {
                current.loading = false;
                match outcome {
                    Ok(series) => {
                        current.series = Some(Arc::new(series));
                        current.last_updated = Some(UtcDateTime::now());
                    }
                    Err(error) => {
                        // stale bars and their timestamp stay visible
                        warn!(
                            symbol = %selection.symbol,
                            interval = %selection.interval,
                            code = error.code(),
                            "series refresh failed: {error}"
                        );
                        current.notice = Some(Notice::for_fetch_failure(&error));
                    }
                }
            });
        }
    };

    tokio::join!(snapshot, series);
}

fn publish(
    state: &watch::Sender<DisplayState>,
    generation: u64,
    apply: impl FnOnce(&mut DisplayState),
) -> bool {
    state.send_if_modified(|current| {
        if current.generation != generation {
            debug!(
                stale = generation,
                current = current.generation,
                "dropping result for replaced selection"
            );
            return false;
        }

        apply(current);
        true
    })
}
