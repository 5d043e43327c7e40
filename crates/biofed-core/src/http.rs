use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

/// Minimal HTTP method set needed by provider adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP request envelope used by adapter transport calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout_ms: 5_000,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// HTTP response envelope returned by a transport.
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

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract behind every provider adapter.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Default no-op transport for deterministic offline tests.
#[derive(Debug, Default)]
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let _ = request;
        Box::pin(async move { Ok(HttpResponse::ok_json("{}")) })
    }
}

/// Production transport using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent("biofed/0.1.0")
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
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            builder = builder.timeout(std::time::Duration::from_millis(request.timeout_ms));

            if let Some(body) = request.body {
                builder = builder
                    .header("content-type", "application/json")
                    .body(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::non_retryable(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Filter-string encoding mode. Most providers take standard
/// percent-encoding; the ITIS Solr endpoint requires a fixed manual
/// substitution table instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlEscape {
    Standard,
    SolrManual,
}

/// One filter value in a query string.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Assemble a query string from key/value filters.
pub fn encode_filters(filters: &[(&str, FilterValue)], escape: UrlEscape) -> String {
    filters
        .iter()
        .map(|(key, value)| {
            let rendered = value.render();
            let encoded = match escape {
                UrlEscape::Standard => urlencoding::encode(&rendered).into_owned(),
                UrlEscape::SolrManual => rendered.replace(' ', "\\%20").replace(',', "\\%2C"),
            };
            format!("{key}={encoded}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Decoded upstream payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Non-HTML markup kept raw; no current provider is consumed as XML.
    Xml(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Xml(_) => None,
        }
    }
}

/// Successful upstream call: decoded payload plus provider HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub url: String,
    pub status: u16,
    pub payload: Payload,
}

/// Classified upstream failure. Status is retained when the provider
/// answered at all, so adapters can surface it in provider metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    Transport { message: String },
    Upstream { status: u16, message: String },
    Shape { status: u16, message: String },
}

impl QueryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { .. } => None,
            Self::Upstream { status, .. } | Self::Shape { status, .. } => Some(*status),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Upstream { message, .. }
            | Self::Shape { message, .. } => message,
        }
    }
}

/// Executes provider queries over an abstract transport, classifying the
/// outcome. One retry on a retryable transport failure, none on HTTP error
/// statuses.
#[derive(Clone)]
pub struct QueryExecutor {
    client: Arc<dyn HttpClient>,
}

impl QueryExecutor {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    pub async fn get(&self, url: &str, timeout_ms: u64) -> Result<QueryResult, QueryError> {
        self.execute(HttpRequest::get(url).with_timeout_ms(timeout_ms))
            .await
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout_ms: u64,
    ) -> Result<QueryResult, QueryError> {
        let request = HttpRequest::post(url)
            .with_body(body.to_string())
            .with_timeout_ms(timeout_ms);
        self.execute(request).await
    }

    async fn execute(&self, request: HttpRequest) -> Result<QueryResult, QueryError> {
        let response = match self.client.execute(request.clone()).await {
            Ok(response) => response,
            Err(error) if error.retryable() => self
                .client
                .execute(request.clone())
                .await
                .map_err(|retry_error| QueryError::Transport {
                    message: retry_error.message().to_owned(),
                })?,
            Err(error) => {
                return Err(QueryError::Transport {
                    message: error.message().to_owned(),
                })
            }
        };

        if !response.is_success() {
            return Err(QueryError::Upstream {
                status: response.status,
                message: format!(
                    "URL {}, code = {}",
                    request.url, response.status
                ),
            });
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => Ok(QueryResult {
                url: request.url,
                status: response.status,
                payload: Payload::Json(value),
            }),
            Err(_) => classify_non_json(request.url, response),
        }
    }
}

/// A payload that fails JSON decoding is either an HTML error page (an
/// upstream failure), other markup (kept raw), or junk (a shape failure).
fn classify_non_json(url: String, response: HttpResponse) -> Result<QueryResult, QueryError> {
    let trimmed = response.body.trim_start();
    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("<html") || lower.starts_with("<!doctype html") {
        return Err(QueryError::Upstream {
            status: 500,
            message: format!("provider returned an HTML error page for {url}"),
        });
    }
    if trimmed.starts_with('<') {
        return Ok(QueryResult {
            url,
            status: response.status,
            payload: Payload::Xml(response.body),
        });
    }
    Err(QueryError::Shape {
        status: response.status,
        message: format!("unrecognized non-JSON response from {url}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_encoding_percent_escapes() {
        let encoded = encode_filters(
            &[("name", FilterValue::from("Poa annua")), ("strict", FilterValue::from(true))],
            UrlEscape::Standard,
        );
        assert_eq!(encoded, "name=Poa%20annua&strict=true");
    }

    #[test]
    fn solr_encoding_uses_manual_substitutions() {
        let encoded = encode_filters(
            &[("q", FilterValue::from("nameWOInd:Poa annua"))],
            UrlEscape::SolrManual,
        );
        assert_eq!(encoded, "q=nameWOInd:Poa\\%20annua");
    }

    #[test]
    fn html_body_classifies_as_upstream_error() {
        let result = classify_non_json(
            String::from("https://example.test/api"),
            HttpResponse::ok_json("<!DOCTYPE html><html><body>502</body></html>"),
        );
        assert!(matches!(result, Err(QueryError::Upstream { status: 500, .. })));
    }

    #[test]
    fn markup_body_is_kept_as_xml() {
        let result = classify_non_json(
            String::from("https://example.test/api"),
            HttpResponse::ok_json("<records><record/></records>"),
        )
        .expect("xml should pass through");
        assert!(matches!(result.payload, Payload::Xml(_)));
    }

    #[test]
    fn junk_body_is_a_shape_error() {
        let result = classify_non_json(
            String::from("https://example.test/api"),
            HttpResponse::ok_json("not json at all"),
        );
        assert!(matches!(result, Err(QueryError::Shape { .. })));
    }
}
