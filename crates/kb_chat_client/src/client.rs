//! HTTP client: validate the query, POST it, hand the body to the stream consumer.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Response;

use crate::error::{ClientError, Result};
use crate::messages::{QueryRequest, QueryResponse, QueryResult};
use crate::stream::{fragments, FragmentStream};

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-api-key";

const STREAM_PATH: &str = "/query/stream";
const COMPLETE_PATH: &str = "/query";

/// Connection settings for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL, e.g. `http://localhost:8000`. Paths are appended to it.
    pub base_url: String,
    /// Forwarded as the `x-api-key` header when set.
    pub tenant: Option<String>,
    /// Whole-request timeout, covering connect and body reads.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tenant: None,
            timeout: None,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Query client. Each call issues exactly one request; there are no retries.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(options: ClientOptions) -> Result<Self> {
        url::Url::parse(&options.base_url)
            .map_err(|e| ClientError::Setup(format!("base URL {:?}: {}", options.base_url, e)))?;

        let mut headers = HeaderMap::new();
        if let Some(tenant) = options.tenant.as_deref() {
            let value = HeaderValue::from_str(tenant)
                .map_err(|e| ClientError::Setup(format!("tenant header: {}", e)))?;
            headers.insert(TENANT_HEADER, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `query` to the streaming endpoint and return the answer fragments.
    ///
    /// Empty queries are rejected before any request is made. A non-success
    /// status is returned as [`ClientError::Status`] without reading the body.
    pub async fn ask(&self, query: &str) -> Result<FragmentStream> {
        let query = validate(query)?;
        let url = format!("{}{}", self.base_url, STREAM_PATH);
        tracing::debug!(%url, "dispatching streamed query");

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(&QueryRequest::new(query))
            .send()
            .await?;
        let response = check_status(response)?;

        Ok(Box::pin(fragments(response.bytes_stream())))
    }

    /// Send `query` to the non-streaming endpoint and return the full result.
    pub async fn ask_complete(&self, query: &str) -> Result<QueryResult> {
        let query = validate(query)?;
        let url = format!("{}{}", self.base_url, COMPLETE_PATH);
        tracing::debug!(%url, "dispatching query");

        let response = self
            .http
            .post(&url)
            .json(&QueryRequest::new(query))
            .send()
            .await?;
        let response = check_status(response)?;
        let text = response.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&text)?;
        Ok(parsed.results)
    }

    /// Health check against the backend root.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let response = self.http.get(&url).send().await?;
        check_status(response)?;
        Ok(())
    }
}

/// Drain a fragment stream from [`Client::ask`], calling `on_fragment` for each.
///
/// Stops at the first error, either from the stream or from `on_fragment`; the
/// stream is dropped then, closing the connection.
pub async fn for_each_fragment<F, E>(
    mut stream: FragmentStream,
    mut on_fragment: F,
) -> std::result::Result<(), E>
where
    F: FnMut(&str) -> std::result::Result<(), E>,
    E: From<ClientError>,
{
    while let Some(fragment) = stream.next().await {
        on_fragment(&fragment?)?;
    }
    Ok(())
}

fn validate(query: &str) -> Result<&str> {
    if query.trim().is_empty() {
        return Err(ClientError::EmptyQuery);
    }
    Ok(query)
}

/// Fail on a non-success status. The response is dropped unread, which closes
/// the connection even when the server keeps the body open.
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::error!(status = status.as_u16(), "query rejected by server");
    Err(ClientError::Status {
        code: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
    })
}
