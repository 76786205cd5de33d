//! Shared fixtures for the integration suites: scripted transport and
//! programmable vendor stubs.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quantum_core::{
    Bar, CompanyProfile, Config, Field, HttpClient, HttpError, HttpRequest, HttpResponse,
    Interval, NewsItem, NewsSource, ProfileSource, ProviderId, Quote, QuoteSource, SearchRequest,
    SearchResult, SearchSource, SeriesRequest, SeriesSource, Symbol, TimeSeries, UtcDateTime,
    Vendor, VendorError, VendorFuture,
};

// =============================================================================
// Scripted HTTP transport
// =============================================================================

type Reply = Result<HttpResponse, HttpError>;

/// Answers requests by URL path suffix and records everything it was sent.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<(String, Reply)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: &str, reply: Reply) {
        self.routes
            .lock()
            .expect("routes lock")
            .push((path.to_owned(), reply));
    }

    pub fn route_json(&self, path: &str, body: serde_json::Value) {
        self.route(path, Ok(HttpResponse::ok_json(body.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.ends_with(path))
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let reply = self
            .routes
            .lock()
            .expect("routes lock")
            .iter()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "{}")));

        self.requests.lock().expect("requests lock").push(request);
        Box::pin(async move { reply })
    }
}

// =============================================================================
// Programmable vendor stubs
// =============================================================================

type Responder<T> = Box<dyn Fn(usize, &str) -> (Duration, Result<T, VendorError>) + Send + Sync>;

/// Vendor stub answering every role call through a closure of
/// `(call index, symbol or query)`, optionally after a delay.
pub struct Stub<T> {
    id: ProviderId,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    respond: Responder<T>,
}

impl<T: Clone + Send + 'static> Stub<T> {
    pub fn new(
        id: ProviderId,
        respond: impl Fn(usize, &str) -> (Duration, Result<T, VendorError>) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    pub fn ok(id: ProviderId, value: T) -> Arc<Self>
    where
        T: Sync,
    {
        Self::new(id, move |_, _| (Duration::ZERO, Ok(value.clone())))
    }

    pub fn failing(id: ProviderId, error: VendorError) -> Arc<Self> {
        Self::new(id, move |_, _| (Duration::ZERO, Err(error.clone())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }

    async fn answer(&self, key: &str) -> Result<T, VendorError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("seen lock").push(key.to_owned());

        let (delay, result) = (self.respond)(index, key);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

impl<T> Vendor for Stub<T> {
    fn id(&self) -> ProviderId {
        self.id
    }
}

impl QuoteSource for Stub<Quote> {
    fn quote<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Quote> {
        Box::pin(async move { self.answer(symbol.as_str()).await })
    }
}

impl ProfileSource for Stub<CompanyProfile> {
    fn profile<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, CompanyProfile> {
        Box::pin(async move { self.answer(symbol.as_str()).await })
    }
}

impl NewsSource for Stub<Vec<NewsItem>> {
    fn news<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Vec<NewsItem>> {
        Box::pin(async move { self.answer(symbol.as_str()).await })
    }
}

impl SeriesSource for Stub<TimeSeries> {
    fn time_series<'a>(&'a self, request: SeriesRequest) -> VendorFuture<'a, TimeSeries> {
        Box::pin(async move { self.answer(request.symbol.as_str()).await })
    }
}

impl SearchSource for Stub<Vec<SearchResult>> {
    fn search<'a>(&'a self, request: SearchRequest) -> VendorFuture<'a, Vec<SearchResult>> {
        Box::pin(async move { self.answer(&request.query).await })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

/// Defaults with no retries, so failure counts are exact.
pub fn test_config() -> Config {
    Config {
        retry: quantum_core::RetryConfig::no_retry(),
        ..Config::default()
    }
}

pub fn quote(raw_symbol: &str, price: f64, previous_close: f64) -> Quote {
    Quote {
        regular_market_price: Field::Value(price),
        previous_close: Field::Value(previous_close),
        currency: Field::Value(String::from("USD")),
        ..Quote::empty(symbol(raw_symbol))
    }
}

pub fn profile(raw_symbol: &str, name: &str) -> CompanyProfile {
    CompanyProfile {
        name: Field::Value(name.to_owned()),
        sector: Field::Value(String::from("Technology")),
        ..CompanyProfile::empty(symbol(raw_symbol))
    }
}

pub fn headlines(count: usize) -> Vec<NewsItem> {
    (0..count)
        .map(|index| NewsItem {
            title: Field::Value(format!("Headline {index}")),
            link: Field::Value(format!("https://news.test/{index}")),
            published_at: Field::Unavailable,
        })
        .collect()
}

/// Daily bars, most recent first, one per close in `closes`.
pub fn series(raw_symbol: &str, interval: Interval, closes: &[f64]) -> TimeSeries {
    let newest = UtcDateTime::parse("2024-03-15T00:00:00Z")
        .expect("valid timestamp")
        .unix_timestamp();

    let bars = closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            let ts = UtcDateTime::from_unix_timestamp(newest - index as i64 * 86_400)
                .expect("valid timestamp");
            Bar::new(ts, *close, *close, *close, *close, Some(1_000)).expect("valid bar")
        })
        .collect();

    TimeSeries {
        symbol: symbol(raw_symbol),
        interval,
        exchange: Field::Value(String::from("NASDAQ")),
        currency: Field::Value(String::from("USD")),
        bars,
    }
}

pub fn search_hit(raw_symbol: &str, exchange: &str, instrument_type: &str) -> SearchResult {
    SearchResult {
        symbol: symbol(raw_symbol),
        name: Field::Value(format!("{raw_symbol} Holdings")),
        exchange: Field::Value(exchange.to_owned()),
        instrument_type: Field::Value(instrument_type.to_owned()),
        country: Field::Unavailable,
        currency: Field::Value(String::from("USD")),
    }
}
