use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Query parameter names whose values are masked in logs.
const SECRET_PARAMS: [&str; 2] = ["apikey", "api_key"];

/// Authentication strategy applied to outgoing vendor requests.
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    QueryParam { name: String, value: String },
    RapidApi { key: String, host: String },
}

impl HttpAuth {
    pub fn apply(&self, request: &mut HttpRequest) {
        match self {
            Self::QueryParam { name, value } => {
                request.query.push((name.clone(), value.clone()));
            }
            Self::RapidApi { key, host } => {
                request
                    .headers
                    .insert(String::from("x-rapidapi-key"), key.clone());
                request
                    .headers
                    .insert(String::from("x-rapidapi-host"), host.clone());
            }
        }
    }
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueryParam { name, .. } => write!(f, "QueryParam({name}=***)"),
            Self::RapidApi { host, .. } => write!(f, "RapidApi({host})"),
        }
    }
}

/// GET request envelope used by vendor clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: &HttpAuth) -> Self {
        auth.apply(&mut self);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// URL with the encoded query string appended.
    pub fn full_url(&self) -> String {
        self.render_url(false)
    }

    /// Same as [`Self::full_url`] with API key values masked.
    pub fn loggable_url(&self) -> String {
        self.render_url(true)
    }

    fn render_url(&self, mask_secrets: bool) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                let secret = mask_secrets
                    && SECRET_PARAMS
                        .iter()
                        .any(|param| name.eq_ignore_ascii_case(param));
                let value = if secret {
                    String::from("***")
                } else {
                    urlencoding::encode(value).into_owned()
                };
                format!("{}={value}", urlencoding::encode(name))
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{query}", self.url)
    }
}

/// HTTP response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Body,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport seam between vendor clients and the network.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("quantum/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(request.timeout);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|error| {
                // the URL carries the API key for query-authenticated vendors
                let error = error.without_url();
                if error.is_timeout() {
                    HttpError::timeout(format!("request timeout: {error}"))
                } else if error.is_connect() {
                    HttpError::connect(format!("connection failed: {error}"))
                } else {
                    HttpError::new(HttpErrorKind::Other, format!("request failed: {error}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|error| {
                HttpError::new(
                    HttpErrorKind::Body,
                    format!("failed to read response body: {}", error.without_url()),
                )
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapidapi_auth_sets_key_and_host_headers() {
        let request = HttpRequest::get("https://yahoo.test/quotes").with_auth(&HttpAuth::RapidApi {
            key: String::from("secret"),
            host: String::from("yahoo-finance15.p.rapidapi.com"),
        });

        assert_eq!(
            request.headers.get("x-rapidapi-key").map(String::as_str),
            Some("secret")
        );
        assert_eq!(
            request.headers.get("x-rapidapi-host").map(String::as_str),
            Some("yahoo-finance15.p.rapidapi.com")
        );
    }

    #[test]
    fn query_auth_is_masked_in_loggable_url() {
        let request = HttpRequest::get("https://twelvedata.test/time_series")
            .with_query("symbol", "BTC/USD")
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: String::from("secret"),
            });

        assert_eq!(request.query_value("apikey"), Some("secret"));
        assert_eq!(
            request.full_url(),
            "https://twelvedata.test/time_series?symbol=BTC%2FUSD&apikey=secret"
        );
        assert_eq!(
            request.loggable_url(),
            "https://twelvedata.test/time_series?symbol=BTC%2FUSD&apikey=***"
        );
    }

    #[test]
    fn auth_debug_never_prints_secrets() {
        let auth = HttpAuth::QueryParam {
            name: String::from("apikey"),
            value: String::from("secret"),
        };
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
