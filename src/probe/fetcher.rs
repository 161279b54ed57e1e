//! Plain HTTP fetching
//!
//! Probes are unauthenticated GETs with default headers. A response is
//! flattened into one lowercase text blob (headers, a newline, then the body
//! decoded lossily) before phrase matching.

use crate::error::{ConfigError, FetchError};
use std::time::Duration;
use tracing::{debug, instrument};

/// A fully read HTTP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedResponse {
    /// Status code
    pub status: u16,
    /// Header name/value pairs, in wire order
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Headers as `name: value` lines
    pub fn header_text(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lowercase headers and body joined by a newline; invalid UTF-8 is replaced
    pub fn searchable_text(&self) -> String {
        format!(
            "{}\n{}",
            self.header_text(),
            String::from_utf8_lossy(&self.body)
        )
        .to_lowercase()
    }

    /// Whether the body carried any bytes
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// Source of HTTP responses
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// GET `url` and read the whole response
    async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError>;
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpFetcher {
    /// Client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                name: "http client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_ms)
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                let value = value
                    .to_str()
                    .map(str::to_string)
                    .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()).into_owned());
                (name.as_str().to_string(), value)
            })
            .collect();

        let body = response.bytes().await.map_err(|e| self.classify(e))?.to_vec();
        debug!(status, bytes = body.len(), "Fetched");

        Ok(FetchedResponse {
            status,
            headers,
            body,
        })
    }
}
