//! Network fetching behind a trait seam.
//!
//! Strategies and the sync processor talk to `Fetcher` rather than
//! reqwest directly, so tests can script network behavior without a
//! server. `HttpFetcher` is the real implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::policy::Destination;
use crate::store::StoredResponse;

/// HTTP request timeout in seconds.
/// Bounds the network race in the stale-revalidation path so a hung
/// fetch cannot stall a response indefinitely.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// A request routed through the worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub destination: Destination,
}

impl FetchRequest {
    pub fn get(url: &str, destination: Destination) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            destination,
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            404 => FetchError::NotFound(truncated),
            500..=599 => FetchError::ServerError(truncated),
            _ => FetchError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Unreachable(e.to_string())
    }
}

/// The network seam. `get` returns a captured response only for HTTP
/// success statuses; everything else is an error the strategies decide
/// how to absorb.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<StoredResponse, FetchError>;

    /// POST a JSON body, returning the response status on HTTP success.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, FetchError>;
}

/// Real fetcher backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, request: &FetchRequest) -> Result<StoredResponse, FetchError> {
        let response = self.client.get(&request.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status.as_u16(), &body));
        }

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(StoredResponse::new(
            request.url.clone(),
            status.as_u16(),
            headers,
            body,
        ))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, FetchError> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status.as_u16(), &body));
        }
        Ok(status.as_u16())
    }
}
