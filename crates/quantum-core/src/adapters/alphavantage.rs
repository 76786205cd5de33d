use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::adapters::parse::{non_blank, number, text};
use crate::data_source::{ProfileSource, Vendor, VendorError, VendorFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::provider_policy::QuotaPolicy;
use crate::throttling::Throttle;
use crate::{CompanyProfile, Field, ProviderId, Symbol};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Alpha Vantage `OVERVIEW` client. Serves company profiles.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    throttle: Throttle,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_key,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout: Duration::from_secs(10),
            throttle: Throttle::from_policy(&QuotaPolicy::alphavantage_default()),
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

    async fn fetch_overview(&self, symbol: &Symbol) -> Result<AlphaVantageOverview, VendorError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(VendorError::missing_key(ProviderId::AlphaVantage));
        };

        if let Err(wait) = self.throttle.acquire() {
            warn!(
                provider = "alphavantage",
                %symbol,
                retry_in_secs = wait.as_secs(),
                "local quota exhausted"
            );
            return Err(VendorError::rate_limited(
                ProviderId::AlphaVantage,
                format!(
                    "daily request quota exhausted; retry in {}s",
                    wait.as_secs()
                ),
            ));
        }

        let request = HttpRequest::get(format!("{}/query", self.base_url))
            .with_query("function", "OVERVIEW")
            .with_query("symbol", symbol.as_str())
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.to_owned(),
            })
            .with_timeout(self.timeout);

        debug!(
            provider = "alphavantage",
            %symbol,
            url = %request.loggable_url(),
            "issuing vendor request"
        );

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| VendorError::from_http(ProviderId::AlphaVantage, &error))?;

        if !response.is_success() {
            return Err(VendorError::from_status(
                ProviderId::AlphaVantage,
                response.status,
                "overview request rejected",
            ));
        }

        serde_json::from_str::<AlphaVantageOverview>(&response.body).map_err(|error| {
            VendorError::malformed(
                ProviderId::AlphaVantage,
                format!("failed to parse overview response: {error}"),
            )
        })
    }
}

impl Vendor for AlphaVantageAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }
}

impl ProfileSource for AlphaVantageAdapter {
    fn profile<'a>(&'a self, symbol: Symbol) -> VendorFuture<'a, CompanyProfile> {
        Box::pin(async move {
            let overview = self.fetch_overview(&symbol).await?;
            normalize_overview(symbol, overview)
        })
    }
}

/// `OVERVIEW` answers 200 for everything. Throttling and bad calls come back
/// as a one-key banner object, unknown symbols as `{}`.
#[derive(Debug, Deserialize)]
struct AlphaVantageOverview {
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

fn normalize_overview(
    symbol: Symbol,
    overview: AlphaVantageOverview,
) -> Result<CompanyProfile, VendorError> {
    if let Some(banner) =
        non_blank(overview.note.as_deref()).or_else(|| non_blank(overview.information.as_deref()))
    {
        return Err(VendorError::rate_limited(ProviderId::AlphaVantage, banner));
    }

    if let Some(message) = non_blank(overview.error_message.as_deref()) {
        // a bad or missing key is reported through the same banner as a bad call
        if message.to_ascii_lowercase().contains("apikey") {
            return Err(VendorError::unauthorized(ProviderId::AlphaVantage, message));
        }
        return Err(VendorError::not_found(ProviderId::AlphaVantage, message));
    }

    if overview.fields.is_empty() {
        return Err(VendorError::not_found(
            ProviderId::AlphaVantage,
            format!("no overview for {symbol}"),
        ));
    }

    let record = Value::Object(overview.fields);
    let description = match text(&record, "Description") {
        Field::Unavailable => text(&record, "description"),
        found => found,
    };

    Ok(CompanyProfile {
        symbol,
        name: text(&record, "Name"),
        sector: text(&record, "Sector"),
        industry: text(&record, "Industry"),
        market_cap: number(&record, "MarketCapitalization"),
        website: text(&record, "OfficialSite"),
        description,
        logo_url: Field::Unavailable,
        icon_url: Field::Unavailable,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data_source::VendorErrorKind;

    fn ibm() -> Symbol {
        Symbol::parse("IBM").expect("valid symbol")
    }

    fn overview(payload: Value) -> AlphaVantageOverview {
        serde_json::from_value(payload).expect("overview should decode")
    }

    #[test]
    fn maps_overview_fields() {
        let payload = json!({
            "Symbol": "IBM",
            "Name": "International Business Machines",
            "Sector": "TECHNOLOGY",
            "Industry": "None",
            "MarketCapitalization": "172000000000",
            "OfficialSite": "https://www.ibm.com",
            "Description": "IBM is an American multinational technology company."
        });

        let profile =
            normalize_overview(ibm(), overview(payload)).expect("profile should normalize");
        assert_eq!(
            profile.name,
            Field::Value(String::from("International Business Machines"))
        );
        assert_eq!(profile.industry, Field::Unavailable);
        assert_eq!(profile.market_cap, Field::Value(172_000_000_000.0));
        assert_eq!(profile.logo_url, Field::Unavailable);
    }

    #[test]
    fn note_banner_is_rate_limited() {
        let payload = json!({"Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."});
        let err = normalize_overview(ibm(), overview(payload)).expect_err("must fail");
        assert_eq!(err.kind(), VendorErrorKind::RateLimited);
    }

    #[test]
    fn empty_object_is_not_found() {
        let err = normalize_overview(ibm(), overview(json!({}))).expect_err("must fail");
        assert_eq!(err.kind(), VendorErrorKind::NotFound);

        let payload = json!({"Error Message": "Invalid API call."});
        let err = normalize_overview(ibm(), overview(payload)).expect_err("must fail");
        assert_eq!(err.kind(), VendorErrorKind::NotFound);
        assert_eq!(err.message(), "Invalid API call.");
    }

    #[test]
    fn invalid_apikey_banner_is_unauthorized() {
        let payload = json!({
            "Error Message": "the parameter apikey is invalid or missing. Please claim your free API key on (https://www.alphavantage.co/support/#api-key)."
        });
        let err = normalize_overview(ibm(), overview(payload)).expect_err("must fail");
        assert_eq!(err.kind(), VendorErrorKind::Unauthorized);
        assert!(!err.retryable());
    }
}
