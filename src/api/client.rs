use crate::api::types::PageResult;
use crate::feed::DateBounds;
use chrono::SecondsFormat;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from talking to the collection service.
///
/// Every variant is a transient failure from the feed's point of view: it is
/// surfaced to the user and never retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the client-side timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not the expected JSON shape
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The configured base URL cannot carry API paths
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    /// The task running the request died before producing a result
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Parameters of one page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub category: String,
    pub bounds: DateBounds,
    pub limit: u32,
    pub offset: u64,
}

/// HTTP client for the collection service.
///
/// Cheap to clone: the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client with its own connection pool.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Self::with_client(http, base_url, timeout)
    }

    /// Build on top of an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        match base_url.scheme() {
            "http" | "https" if !base_url.cannot_be_a_base() => {}
            scheme => {
                return Err(ApiError::InvalidBaseUrl(format!(
                    "unsupported scheme '{scheme}' (only http/https allowed)"
                )))
            }
        }
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /categories`: ordered category names.
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["categories"])?;
        self.get_json(url).await
    }

    /// `GET /categories/{category}/articles`: one page of the filtered listing.
    pub async fn articles(&self, query: &PageQuery) -> Result<PageResult, ApiError> {
        let url = self.articles_url(query)?;
        let page: PageResult = self.get_json(url).await?;
        tracing::debug!(
            category = %query.category,
            offset = query.offset,
            received = page.articles.len(),
            total = page.total,
            "Fetched article page"
        );
        Ok(page)
    }

    pub(crate) fn articles_url(&self, query: &PageQuery) -> Result<Url, ApiError> {
        let mut url = self.endpoint(&["categories", &query.category, "articles"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(
                "since",
                &query.bounds.since.to_rfc3339_opts(SecondsFormat::Secs, false),
            );
            if let Some(until) = query.bounds.until {
                pairs.append_pair("until", &until.to_rfc3339_opts(SecondsFormat::Secs, false));
            }
            pairs.append_pair("limit", &query.limit.to_string());
            pairs.append_pair("offset", &query.offset.to_string());
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode its JSON body.
    ///
    /// The timeout covers the whole exchange, from sending the request to the
    /// last body byte.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let bytes = tokio::time::timeout(self.timeout, self.fetch_body(url))
            .await
            .map_err(|_| ApiError::Timeout)??;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_body(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            tracing::warn!(url = %url, status = %response.status(), "API request failed");
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
