//! Fan-out/fan-in over the vendor clients.
//!
//! [`Aggregator::snapshot`] calls the profile, quote and news vendors
//! concurrently, keeps whatever succeeded, and caches the merged
//! [`StockSnapshot`] per symbol. Only a total failure surfaces as an error.
//!
//! ```rust,ignore
//! use quantum_core::{AggregatorBuilder, Config, SnapshotOptions};
//!
//! let aggregator = AggregatorBuilder::new(Config::from_env()?).build()?;
//! let snapshot = aggregator.snapshot("aapl", SnapshotOptions::default()).await?;
//! for item in snapshot.headline_news() {
//!     println!("{}", item.title);
//! }
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::adapters::{AlphaVantageAdapter, TwelveDataAdapter, YahooAdapter};
use crate::cache::{CacheMode, CacheWrite, SnapshotCache};
use crate::config::Config;
use crate::data_source::{
    NewsSource, ProfileSource, QuoteSource, SearchRequest, SearchSource, SeriesRequest,
    SeriesSource, VendorError, VendorFuture,
};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{
    AggregationError, AggregatorError, Interval, MarketFilter, ProviderId, SearchResult,
    StockSnapshot, Symbol, TimeSeries, UtcDateTime, ValidationError, VendorFailure, VendorRole,
};

/// Per-call snapshot behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotOptions {
    pub cache_mode: CacheMode,
}

impl SnapshotOptions {
    /// Skip any cached entry but store the fresh result.
    pub const fn force_refresh() -> Self {
        Self {
            cache_mode: CacheMode::Refresh,
        }
    }

    pub const fn bypass_cache() -> Self {
        Self {
            cache_mode: CacheMode::Bypass,
        }
    }
}

/// Multi-vendor aggregation service. Share it behind an `Arc`.
pub struct Aggregator {
    quotes: Arc<dyn QuoteSource>,
    profiles: Arc<dyn ProfileSource>,
    news: Arc<dyn NewsSource>,
    series: Arc<dyn SeriesSource>,
    search: Arc<dyn SearchSource>,
    cache: SnapshotCache,
    config: Config,
    generation: AtomicU64,
}

impl Aggregator {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Merged profile, quote and news for `symbol`.
    pub async fn snapshot(
        &self,
        symbol: &str,
        options: SnapshotOptions,
    ) -> Result<Arc<StockSnapshot>, AggregatorError> {
        let symbol = Symbol::parse(symbol).map_err(AggregatorError::InvalidSymbol)?;

        if options.cache_mode.reads() {
            if let Some(cached) = self.cache.get(&symbol).await {
                debug!(%symbol, generation = cached.generation, "snapshot cache hit");
                return Ok(cached);
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%symbol, generation, cache_mode = ?options.cache_mode, "aggregating snapshot");

        let (profile, quote, news) = tokio::join!(
            self.call(VendorRole::Profile, self.profiles.id(), Some(&symbol), || {
                self.profiles.profile(symbol.clone())
            }),
            self.call(VendorRole::Quote, self.quotes.id(), Some(&symbol), || {
                self.quotes.quote(symbol.clone())
            }),
            self.call(VendorRole::News, self.news.id(), Some(&symbol), || {
                self.news.news(symbol.clone())
            }),
        );

        let mut failures = Vec::new();
        let profile = settle(VendorRole::Profile, profile, &mut failures);
        let quote = settle(VendorRole::Quote, quote, &mut failures);
        let news = settle(VendorRole::News, news, &mut failures);

        if profile.is_none() && quote.is_none() && news.is_none() {
            warn!(%symbol, generation, "every vendor failed");
            return Err(AggregationError { symbol, failures }.into());
        }

        let snapshot = Arc::new(StockSnapshot {
            symbol,
            profile,
            quote,
            news: news.unwrap_or_default(),
            fetched_at: UtcDateTime::now(),
            failures,
            generation,
            headline_limit: self.config.news_limit,
        });

        info!(
            symbol = %snapshot.symbol,
            generation,
            failed = snapshot.failures.len(),
            news = snapshot.news.len(),
            "snapshot assembled"
        );

        if options.cache_mode.writes() {
            if let CacheWrite::Superseded(newer) = self.cache.store(Arc::clone(&snapshot)).await {
                return Ok(newer);
            }
        }

        Ok(snapshot)
    }

    /// Chart bars for `symbol` at `interval`. Never cached.
    pub async fn time_series(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<TimeSeries, AggregatorError> {
        let symbol = Symbol::parse(symbol).map_err(AggregatorError::InvalidSymbol)?;
        let request = SeriesRequest::new(symbol, interval, self.config.series_output_size)
            .map_err(AggregatorError::InvalidQuery)?;

        let series = self
            .call(
                VendorRole::TimeSeries,
                self.series.id(),
                Some(&request.symbol),
                || self.series.time_series(request.clone()),
            )
            .await?;
        Ok(series)
    }

    /// Symbol search narrowed by `filter`.
    pub async fn search(
        &self,
        query: &str,
        filter: MarketFilter,
    ) -> Result<Vec<SearchResult>, AggregatorError> {
        let request = SearchRequest::new(query).map_err(AggregatorError::InvalidQuery)?;
        let results = self
            .call(VendorRole::Search, self.search.id(), None, || {
                self.search.search(request.clone())
            })
            .await?;

        Ok(results
            .into_iter()
            .filter(|result| filter.matches(result))
            .collect())
    }

    /// Drop the cached snapshot for `symbol`.
    pub async fn evict(&self, symbol: &Symbol) -> bool {
        let removed = self.cache.remove(symbol).await;
        if removed {
            debug!(%symbol, "evicted cached snapshot");
        }
        removed
    }

    async fn call<'a, T>(
        &self,
        role: VendorRole,
        provider: ProviderId,
        symbol: Option<&Symbol>,
        invoke: impl Fn() -> VendorFuture<'a, T>,
    ) -> Result<T, VendorError> {
        let mut attempt = 0;
        loop {
            match self.bounded(provider, role, invoke()).await {
                Ok(value) => return Ok(value),
                Err(error) if self.config.retry.should_retry(&error, attempt) => {
                    self.back_off(role, &error, attempt, symbol).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(
                        symbol = symbol.map(Symbol::as_str),
                        role = %role,
                        provider = %provider,
                        kind = %error.kind(),
                        attempts = attempt + 1,
                        "vendor call failed: {}",
                        error.message()
                    );
                    return Err(error);
                }
            }
        }
    }

    async fn bounded<T>(
        &self,
        provider: ProviderId,
        role: VendorRole,
        call: VendorFuture<'_, T>,
    ) -> Result<T, VendorError> {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
            Err(VendorError::unreachable(
                provider,
                format!("{role} call exceeded {}ms", timeout.as_millis()),
            ))
        })
    }

    async fn back_off(
        &self,
        role: VendorRole,
        error: &VendorError,
        attempt: u32,
        symbol: Option<&Symbol>,
    ) {
        let delay = self.config.retry.delay_for_attempt(attempt);
        warn!(
            symbol = symbol.map(Symbol::as_str),
            role = %role,
            provider = %error.provider(),
            kind = %error.kind(),
            retry_in_ms = delay.as_millis() as u64,
            "retrying vendor call"
        );
        tokio::time::sleep(delay).await;
    }
}

impl Debug for Aggregator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("quotes", &self.quotes.id())
            .field("profiles", &self.profiles.id())
            .field("news", &self.news.id())
            .field("series", &self.series.id())
            .field("search", &self.search.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn settle<T>(
    role: VendorRole,
    outcome: Result<T, VendorError>,
    failures: &mut Vec<VendorFailure>,
) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(error) => {
            failures.push(VendorFailure::new(role, &error));
            None
        }
    }
}

/// Wires vendor clients from a [`Config`].
///
/// | Role | Default client |
/// |------|----------------|
/// | Quote, News | [`YahooAdapter`] (RapidAPI key) |
/// | Profile | [`AlphaVantageAdapter`] |
/// | Time series, Search | [`TwelveDataAdapter`] |
///
/// Any role can be replaced, which is how tests inject stubs.
pub struct AggregatorBuilder {
    config: Config,
    http_client: Option<Arc<dyn HttpClient>>,
    quote_source: Option<Arc<dyn QuoteSource>>,
    profile_source: Option<Arc<dyn ProfileSource>>,
    news_source: Option<Arc<dyn NewsSource>>,
    series_source: Option<Arc<dyn SeriesSource>>,
    search_source: Option<Arc<dyn SearchSource>>,
}

impl AggregatorBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http_client: None,
            quote_source: None,
            profile_source: None,
            news_source: None,
            series_source: None,
            search_source: None,
        }
    }

    /// Transport shared by the default vendor clients.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_quote_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.quote_source = Some(source);
        self
    }

    pub fn with_profile_source(mut self, source: Arc<dyn ProfileSource>) -> Self {
        self.profile_source = Some(source);
        self
    }

    pub fn with_news_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.news_source = Some(source);
        self
    }

    pub fn with_series_source(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.series_source = Some(source);
        self
    }

    pub fn with_search_source(mut self, source: Arc<dyn SearchSource>) -> Self {
        self.search_source = Some(source);
        self
    }

    pub fn build(self) -> Result<Aggregator, ValidationError> {
        self.config.validate()?;

        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let timeout = self.config.request_timeout;
        let keys = &self.config.keys;

        let yahoo = Arc::new(
            YahooAdapter::new(Arc::clone(&http_client), keys.rapidapi.clone())
                .with_timeout(timeout),
        );
        let twelvedata = Arc::new(
            TwelveDataAdapter::new(Arc::clone(&http_client), keys.twelvedata.clone())
                .with_timeout(timeout),
        );

        let quotes = self
            .quote_source
            .unwrap_or_else(|| Arc::clone(&yahoo) as Arc<dyn QuoteSource>);
        let news = self
            .news_source
            .unwrap_or_else(|| yahoo as Arc<dyn NewsSource>);
        let profiles = self.profile_source.unwrap_or_else(|| {
            Arc::new(
                AlphaVantageAdapter::new(Arc::clone(&http_client), keys.alphavantage.clone())
                    .with_timeout(timeout),
            ) as Arc<dyn ProfileSource>
        });
        let series = self
            .series_source
            .unwrap_or_else(|| Arc::clone(&twelvedata) as Arc<dyn SeriesSource>);
        let search = self
            .search_source
            .unwrap_or_else(|| twelvedata as Arc<dyn SearchSource>);

        info!(keys = ?self.config.keys, "aggregator configured");

        Ok(Aggregator {
            quotes,
            profiles,
            news,
            series,
            search,
            cache: SnapshotCache::new(self.config.snapshot_ttl),
            config: self.config,
            generation: AtomicU64::new(0),
        })
    }
}
