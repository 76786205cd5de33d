//! Behavior tests for the polling dashboard session: selection changes,
//! stale-result suppression, polling cadence and failure handling.

mod support;

use std::sync::Arc;
use std::time::Duration;

use quantum_core::{
    Aggregator, AggregatorBuilder, CompanyProfile, DashboardSession, DisplayState, Interval,
    NewsItem, NoticeLevel, ProviderId, Quote, Selection, SessionConfig, TimeSeries,
    ValidationError, VendorError,
};
use tokio::sync::watch;

use support::{headlines, profile, quote, series, symbol, test_config, Stub};

struct Harness {
    aggregator: Arc<Aggregator>,
    quotes: Arc<Stub<Quote>>,
    bars: Arc<Stub<TimeSeries>>,
}

fn harness(bars: Arc<Stub<TimeSeries>>) -> Harness {
    let quotes = Stub::new(ProviderId::Yahoo, |_, symbol| {
        (Duration::ZERO, Ok(quote(symbol, 100.0, 99.0)))
    });
    let profiles = Stub::new(ProviderId::AlphaVantage, |_, symbol| {
        (Duration::ZERO, Ok(profile(symbol, "Listed Co")))
    });
    let aggregator = AggregatorBuilder::new(test_config())
        .with_quote_source(quotes.clone())
        .with_profile_source(profiles)
        .with_news_source(Stub::ok(ProviderId::Yahoo, headlines(2)))
        .with_series_source(bars.clone())
        .build()
        .expect("valid config");

    Harness {
        aggregator: Arc::new(aggregator),
        quotes,
        bars,
    }
}

fn steady_series() -> Arc<Stub<TimeSeries>> {
    Stub::new(ProviderId::TwelveData, |_, symbol| {
        (Duration::ZERO, Ok(series(symbol, Interval::OneDay, &[10.0, 9.0])))
    })
}

fn start(harness: &Harness, raw_symbol: &str) -> DashboardSession {
    DashboardSession::start(
        Arc::clone(&harness.aggregator),
        Selection::new(raw_symbol, Interval::OneDay).expect("valid selection"),
        SessionConfig::default(),
    )
}

async fn first_series(updates: &mut watch::Receiver<DisplayState>) -> DisplayState {
    updates
        .wait_for(|state| state.series.is_some())
        .await
        .expect("session should stay alive")
        .clone()
}

// =============================================================================
// Selection changes
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_symbol_changes_while_a_series_is_pending_the_old_series_never_appears() {
    // Given: AAPL bars take five seconds, TSLA bars one
    let bars = Stub::new(ProviderId::TwelveData, |_, symbol| {
        let delay = if symbol == "AAPL" {
            Duration::from_secs(5)
        } else {
            Duration::from_secs(1)
        };
        (delay, Ok(series(symbol, Interval::OneDay, &[10.0, 9.0])))
    });
    let harness = harness(bars);
    let mut session = start(&harness, "AAPL");
    let mut updates = session.subscribe();

    // When: The user switches to TSLA before AAPL bars arrive
    tokio::time::sleep(Duration::from_millis(500)).await;
    session
        .select("TSLA", Interval::OneDay)
        .await
        .expect("valid selection");

    // Then: Only TSLA bars are ever displayed
    let state = first_series(&mut updates).await;
    assert_eq!(state.selection.symbol, symbol("TSLA"));
    assert_eq!(state.generation, 2);
    assert_eq!(
        state.series.as_ref().map(|series| series.symbol.clone()),
        Some(symbol("TSLA"))
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = session.state();
    assert_eq!(
        state.series.as_ref().map(|series| series.symbol.clone()),
        Some(symbol("TSLA"))
    );
    assert_eq!(harness.bars.seen(), vec!["AAPL", "TSLA"]);
}

#[tokio::test(start_paused = true)]
async fn when_symbol_changes_the_previous_snapshot_is_evicted() {
    // Given: A session showing AAPL with its snapshot cached
    let harness = harness(steady_series());
    let mut session = start(&harness, "AAPL");
    let mut updates = session.subscribe();
    updates
        .wait_for(|state| state.snapshot.is_some())
        .await
        .expect("session should stay alive");
    assert!(harness.aggregator.cache().get(&symbol("AAPL")).await.is_some());

    // When: The user switches to TSLA
    session
        .select("TSLA", Interval::OneDay)
        .await
        .expect("valid selection");

    // Then: AAPL is gone from the cache and the display is reset
    assert!(harness.aggregator.cache().get(&symbol("AAPL")).await.is_none());
    let state = session.state();
    assert!(state.loading);
    assert!(state.series.is_none());
    assert!(state.last_updated.is_none());
    assert!(state
        .snapshot
        .as_ref()
        .map_or(true, |snapshot| snapshot.symbol == symbol("TSLA")));
}

#[tokio::test(start_paused = true)]
async fn when_only_the_interval_changes_the_snapshot_is_kept() {
    // Given: A session showing AAPL daily bars
    let harness = harness(steady_series());
    let mut session = start(&harness, "AAPL");
    let mut updates = session.subscribe();
    first_series(&mut updates).await;
    updates
        .wait_for(|state| state.snapshot.is_some())
        .await
        .expect("session should stay alive");

    // When: The user switches to hourly bars
    session
        .set_interval(Interval::OneHour)
        .await
        .expect("valid selection");

    // Then: The snapshot stays and is not fetched again
    let state = session.state();
    assert!(state.snapshot.is_some());
    assert!(state.series.is_none());
    assert_eq!(state.selection.interval, Interval::OneHour);

    first_series(&mut updates).await;
    assert_eq!(harness.quotes.calls(), 1);
    assert_eq!(harness.bars.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn when_the_same_selection_is_chosen_again_nothing_restarts() {
    let harness = harness(steady_series());
    let mut session = start(&harness, "AAPL");

    session
        .select(" aapl ", Interval::OneDay)
        .await
        .expect("valid selection");

    assert_eq!(session.generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_a_blank_symbol_is_selected_the_session_keeps_polling_the_old_one() {
    let harness = harness(steady_series());
    let mut session = start(&harness, "AAPL");

    let error = session
        .select("   ", Interval::OneDay)
        .await
        .expect_err("blank symbol must be rejected");

    assert_eq!(error, ValidationError::EmptySymbol);
    assert_eq!(session.generation(), 1);
    assert_eq!(session.state().selection.symbol, symbol("AAPL"));
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_the_poll_interval_elapses_the_series_is_refetched() {
    // Given: A running session with its first bars loaded
    let harness = harness(steady_series());
    let session = start(&harness, "AAPL");
    let mut updates = session.subscribe();
    let first = first_series(&mut updates).await;
    assert!(!first.loading);
    assert!(first.last_updated.is_some());
    assert_eq!(harness.bars.calls(), 1);

    // When: One and then two polling intervals pass
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(harness.bars.calls(), 2);
    tokio::time::sleep(Duration::from_secs(60)).await;

    // Then: The series is fetched once per interval, the snapshot only once
    assert_eq!(harness.bars.calls(), 3);
    assert_eq!(harness.quotes.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn when_a_refresh_fails_stale_bars_stay_with_a_notice() {
    // Given: Bars load once, then the vendor starts failing
    let bars = Stub::new(ProviderId::TwelveData, |call, symbol| {
        let result = if call == 0 {
            Ok(series(symbol, Interval::OneDay, &[10.0, 9.0]))
        } else {
            Err(VendorError::rate_limited(
                ProviderId::TwelveData,
                "8 requests per minute",
            ))
        };
        (Duration::ZERO, result)
    });
    let harness = harness(bars);
    let session = start(&harness, "AAPL");
    let mut updates = session.subscribe();
    let first = first_series(&mut updates).await;

    // When: The next poll fails
    tokio::time::sleep(Duration::from_secs(61)).await;

    // Then: The previous bars and timestamp remain, and a notice is shown
    let state = session.state();
    assert_eq!(state.series, first.series);
    assert_eq!(state.last_updated, first.last_updated);
    let notice = state.active_notice().expect("failure raises a notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Failed to fetch stock data");

    // And: The notice disappears after its lifetime
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(session.state().active_notice().is_none());
}

#[tokio::test(start_paused = true)]
async fn when_every_snapshot_vendor_fails_the_session_reports_it() {
    let aggregator = AggregatorBuilder::new(test_config())
        .with_quote_source(Stub::<Quote>::failing(
            ProviderId::Yahoo,
            VendorError::missing_key(ProviderId::Yahoo),
        ))
        .with_profile_source(Stub::<CompanyProfile>::failing(
            ProviderId::AlphaVantage,
            VendorError::missing_key(ProviderId::AlphaVantage),
        ))
        .with_news_source(Stub::<Vec<NewsItem>>::failing(
            ProviderId::Yahoo,
            VendorError::missing_key(ProviderId::Yahoo),
        ))
        .with_series_source(steady_series())
        .build()
        .expect("valid config");

    let session = DashboardSession::start(
        Arc::new(aggregator),
        Selection::new("AAPL", Interval::OneDay).expect("valid selection"),
        SessionConfig::default(),
    );
    let mut updates = session.subscribe();

    let state = updates
        .wait_for(|state| !state.snapshot_loading)
        .await
        .expect("session should stay alive")
        .clone();

    assert!(state.snapshot.is_none());
    let notice = state.active_notice().expect("failure raises a notice");
    assert_eq!(notice.message, "Failed to fetch stock data");
}

#[tokio::test(start_paused = true)]
async fn when_the_session_stops_no_further_polls_happen() {
    let harness = harness(steady_series());
    let mut session = start(&harness, "AAPL");
    let mut updates = session.subscribe();
    first_series(&mut updates).await;

    session.stop();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(harness.bars.calls(), 1);
    assert!(session.state().series.is_some());
}
