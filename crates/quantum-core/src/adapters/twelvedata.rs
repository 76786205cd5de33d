use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::parse::{clean_text, non_blank, required_number};
use crate::data_source::{
    SearchRequest, SearchSource, SeriesRequest, SeriesSource, Vendor, VendorError,
    VendorErrorKind, VendorFuture,
};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::provider_policy::QuotaPolicy;
use crate::throttling::Throttle;
use crate::{Bar, ProviderId, SearchResult, Symbol, TimeSeries, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// Twelve Data client. Serves time series and symbol search.
#[derive(Clone)]
pub struct TwelveDataAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    throttle: Throttle,
}

impl TwelveDataAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout: Duration::from_secs(10),
            throttle: Throttle::from_policy(&QuotaPolicy::twelvedata_default()),
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

    pub fn with_quota(mut self, policy: &QuotaPolicy) -> Self {
        self.throttle = Throttle::from_policy(policy);
        self
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, VendorError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(VendorError::missing_key(ProviderId::TwelveData));
        };

        if let Err(wait) = self.throttle.acquire() {
            warn!(
                provider = "twelvedata",
                path,
                retry_in_secs = wait.as_secs(),
                "local quota exhausted"
            );
            return Err(VendorError::rate_limited(
                ProviderId::TwelveData,
                format!(
                    "per-minute request quota exhausted; retry in {}s",
                    wait.as_secs()
                ),
            ));
        }

        let mut request = HttpRequest::get(format!("{}{path}", self.base_url));
        for (name, value) in query {
            request = request.with_query(*name, value.as_str());
        }
        let request = request
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.to_owned(),
            })
            .with_timeout(self.timeout);

        debug!(provider = "twelvedata", url = %request.loggable_url(), "issuing vendor request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| VendorError::from_http(ProviderId::TwelveData, &error))?;

        let status = serde_json::from_str::<TwelveDataStatus>(&response.body);
        if !response.is_success() {
            let message = status
                .ok()
                .and_then(|status| non_blank(status.message.as_deref()))
                .unwrap_or_else(|| String::from("request rejected"));
            return Err(VendorError::from_status(
                ProviderId::TwelveData,
                response.status,
                message,
            ));
        }

        status.map_err(malformed)?.check()?;
        serde_json::from_str::<T>(&response.body).map_err(malformed)
    }
}

impl Vendor for TwelveDataAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::TwelveData
    }
}

impl SeriesSource for TwelveDataAdapter {
    fn time_series<'a>(&'a self, request: SeriesRequest) -> VendorFuture<'a, TimeSeries> {
        Box::pin(async move {
            let payload: TwelveDataSeries = self
                .fetch(
                    "/time_series",
                    &[
                        ("symbol", request.symbol.as_str().to_owned()),
                        ("interval", request.interval.as_str().to_owned()),
                        ("outputsize", request.output_size.to_string()),
                    ],
                )
                .await?;
            normalize_series(&request, payload)
        })
    }
}

impl SearchSource for TwelveDataAdapter {
    fn search<'a>(&'a self, request: SearchRequest) -> VendorFuture<'a, Vec<SearchResult>> {
        Box::pin(async move {
            let payload: TwelveDataSearch = self
                .fetch("/symbol_search", &[("symbol", request.query.clone())])
                .await?;
            Ok(normalize_search(payload))
        })
    }
}

fn malformed(error: serde_json::Error) -> VendorError {
    VendorError::malformed(
        ProviderId::TwelveData,
        format!("failed to parse response: {error}"),
    )
}

/// Header every Twelve Data response carries. Most failures arrive as a 200
/// with `{"status": "error", "code": N, "message": ..}`.
#[derive(Debug, Default, Deserialize)]
struct TwelveDataStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

impl TwelveDataStatus {
    fn check(&self) -> Result<(), VendorError> {
        if self.status.as_deref() != Some("error") {
            return Ok(());
        }

        let message = non_blank(self.message.as_deref())
            .unwrap_or_else(|| String::from("unspecified error"));
        let kind = match self.code {
            Some(429) => VendorErrorKind::RateLimited,
            Some(401 | 403) => VendorErrorKind::Unauthorized,
            Some(400 | 404) => VendorErrorKind::NotFound,
            Some(500..=599) => VendorErrorKind::Unreachable,
            _ => VendorErrorKind::MalformedResponse,
        };

        Err(VendorError::new(kind, ProviderId::TwelveData, message))
    }
}

#[derive(Debug, Default, Deserialize)]
struct TwelveDataMeta {
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

/// Rows stay loosely typed so one bad bar drops only itself.
#[derive(Debug, Deserialize)]
struct TwelveDataSeries {
    #[serde(default)]
    meta: TwelveDataMeta,
    #[serde(default)]
    values: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TwelveDataSearch {
    data: Vec<TwelveDataMatch>,
}

#[derive(Debug, Deserialize)]
struct TwelveDataMatch {
    symbol: String,
    #[serde(default)]
    instrument_name: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    instrument_type: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

fn normalize_series(
    request: &SeriesRequest,
    payload: TwelveDataSeries,
) -> Result<TimeSeries, VendorError> {
    let Some(values) = payload.values else {
        return Err(VendorError::not_found(
            ProviderId::TwelveData,
            format!("no {} series for {}", request.interval, request.symbol),
        ));
    };

    let bars = values
        .iter()
        .filter_map(|row| {
            let ts = UtcDateTime::parse_vendor_datetime(row.get("datetime")?.as_str()?).ok()?;
            let volume = required_number(row, "volume")
                .filter(|volume| *volume >= 0.0)
                .map(|volume| volume as u64);
            Bar::new(
                ts,
                required_number(row, "open")?,
                required_number(row, "high")?,
                required_number(row, "low")?,
                required_number(row, "close")?,
                volume,
            )
            .ok()
        })
        .collect::<Vec<_>>();

    if bars.len() < values.len() {
        debug!(
            provider = "twelvedata",
            symbol = %request.symbol,
            skipped = values.len() - bars.len(),
            "dropped malformed bars"
        );
    }

    if bars.is_empty() {
        return Err(VendorError::not_found(
            ProviderId::TwelveData,
            format!("no {} series for {}", request.interval, request.symbol),
        ));
    }

    Ok(TimeSeries {
        symbol: request.symbol.clone(),
        interval: request.interval,
        exchange: clean_text(payload.meta.exchange.as_deref()),
        currency: clean_text(payload.meta.currency.as_deref()),
        bars,
    })
}

fn normalize_search(payload: TwelveDataSearch) -> Vec<SearchResult> {
    payload
        .data
        .into_iter()
        .filter_map(|entry| {
            // exotic tickers (indices with '^', spaces) cannot be queried downstream
            let symbol = Symbol::parse(&entry.symbol).ok()?;
            Some(SearchResult {
                symbol,
                name: clean_text(entry.instrument_name.as_deref()),
                exchange: clean_text(entry.exchange.as_deref()),
                instrument_type: clean_text(entry.instrument_type.as_deref()),
                country: clean_text(entry.country.as_deref()),
                currency: clean_text(entry.currency.as_deref()),
            })
        })
        .collect()
}
