use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::adapters::parse::{non_blank, number, text, unix_time};
use crate::data_source::{NewsSource, QuoteSource, Vendor, VendorError, VendorFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{Field, NewsItem, ProviderId, Quote, Symbol, UtcDateTime};

pub const RAPIDAPI_HOST: &str = "yahoo-finance15.p.rapidapi.com";
const DEFAULT_BASE_URL: &str = "https://yahoo-finance15.p.rapidapi.com";
const QUOTES_PATH: &str = "/api/v1/markets/stock/quotes";
const NEWS_PATH: &str = "/api/v1/markets/news";

/// Yahoo Finance through the RapidAPI gateway. Serves quotes and news.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch(&self, path: &str, symbol: &Symbol) -> Result<YahooBody, VendorError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(VendorError::missing_key(ProviderId::Yahoo));
        };

        let request = HttpRequest::get(format!("{}{path}", self.base_url))
            .with_query("ticker", symbol.as_str())
            .with_auth(&HttpAuth::RapidApi {
                key: api_key.to_owned(),
                host: String::from(RAPIDAPI_HOST),
            })
            .with_timeout(self.timeout);

        debug!(
            provider = "yahoo",
            %symbol,
            url = %request.loggable_url(),
            "issuing vendor request"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| VendorError::from_http(ProviderId::Yahoo, &error))?;

        let envelope = serde_json::from_str::<YahooEnvelope>(&response.body);
        if !response.is_success() {
            let message = envelope
                .ok()
                .and_then(|envelope| non_blank(envelope.message.as_deref()))
                .unwrap_or_else(|| String::from("request rejected"));
            return Err(VendorError::from_status(
                ProviderId::Yahoo,
                response.status,
                message,
            ));
        }

        let envelope = envelope.map_err(|error| {
            VendorError::malformed(
                ProviderId::Yahoo,
                format!("failed to parse response: {error}"),
            )
        })?;

        match envelope.body {
            Some(body) => Ok(body),
            None => Err(classify_gateway_message(envelope.message.as_deref())),
        }
    }
}

impl Vendor for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }
}

impl QuoteSource for YahooAdapter {
    fn quote<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Quote> {
        Box::pin(async move {
            let body = self.fetch(QUOTES_PATH, &symbol).await?;
            normalize_quote(symbol, body)
        })
    }
}

impl NewsSource for YahooAdapter {
    fn news<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, Vec<NewsItem>> {
        Box::pin(async move {
            let body = self.fetch(NEWS_PATH, &symbol).await?;
            normalize_news(body)
        })
    }
}

/// `{"meta": {..}, "body": ..}` on success; the gateway answers with a bare
/// `message` when it refuses the call.
#[derive(Debug, Deserialize)]
struct YahooEnvelope {
    #[serde(default)]
    body: Option<YahooBody>,
    #[serde(default)]
    message: Option<String>,
}

/// Quotes arrive as a list of records, news as a list of articles. Single
/// tickers sometimes come back as one bare record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YahooBody {
    List(Vec<Value>),
    Record(Value),
}

/// RapidAPI reports quota and subscription problems as a bare `message`.
fn classify_gateway_message(message: Option<&str>) -> VendorError {
    let Some(message) = non_blank(message) else {
        return VendorError::malformed(ProviderId::Yahoo, "response has no body");
    };

    let lowered = message.to_ascii_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));

    if mentions(&["exceeded", "rate limit", "too many"]) {
        VendorError::rate_limited(ProviderId::Yahoo, message)
    } else if mentions(&["not subscribed", "invalid api key"]) {
        VendorError::unauthorized(ProviderId::Yahoo, message)
    } else {
        VendorError::malformed(ProviderId::Yahoo, message)
    }
}

fn normalize_quote(symbol: Symbol, body: YahooBody) -> Result<Quote, VendorError> {
    let record = match body {
        YahooBody::List(entries) => entries.into_iter().next(),
        YahooBody::Record(entry) if entry.is_object() => Some(entry),
        YahooBody::Record(_) => {
            return Err(VendorError::malformed(
                ProviderId::Yahoo,
                "quote body is neither a list nor an object",
            ))
        }
    }
    .ok_or_else(|| VendorError::not_found(ProviderId::Yahoo, format!("no quote for {symbol}")))?;

    Ok(Quote {
        symbol,
        regular_market_price: number(&record, "regularMarketPrice"),
        previous_close: number(&record, "regularMarketPreviousClose"),
        day_high: number(&record, "regularMarketDayHigh"),
        day_low: number(&record, "regularMarketDayLow"),
        year_high: number(&record, "fiftyTwoWeekHigh"),
        year_low: number(&record, "fiftyTwoWeekLow"),
        pe_ratio: number(&record, "trailingPE"),
        dividend_yield: number(&record, "dividendYield"),
        dividend_date: unix_time(&record, "dividendDate"),
        eps: number(&record, "epsTrailingTwelveMonths"),
        market_cap: number(&record, "marketCap"),
        earnings_date: unix_time(&record, "earningsTimestamp"),
        currency: text(&record, "currency"),
    })
}

fn normalize_news(body: YahooBody) -> Result<Vec<NewsItem>, VendorError> {
    let YahooBody::List(entries) = body else {
        return Err(VendorError::malformed(
            ProviderId::Yahoo,
            "news body is not a list",
        ));
    };

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| NewsItem {
            title: text(entry, "title"),
            link: text(entry, "link"),
            published_at: match text(entry, "pubDate") {
                Field::Value(raw) => UtcDateTime::parse_news_date(&raw).ok().into(),
                Field::Unavailable => unix_time(entry, "providerPublishTime"),
            },
        })
        .collect())
}
