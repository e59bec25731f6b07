//! Concurrent HTTP fetching
//!
//! Fetches a batch of pages at once, one request per URL, and returns the outcome
//! of every request in input order.

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// User agent sent with every request
const USER_AGENT: &str = concat!("confpapers/", env!("CARGO_PKG_VERSION"));

/// Outcome of fetching a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// HTTP 200 with the full response body
    Success(String),
    /// Any other status or a transport error, with a readable reason
    Failure(String),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }
}

/// HTTP client that fetches batches of pages concurrently
#[derive(Debug, Clone)]
pub struct Fetcher {
    /// HTTP client shared by every request
    http_client: Client,
}

impl Fetcher {
    /// Creates a new Fetcher with the transport's default timeouts
    pub fn new() -> Self {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self { http_client }
    }

    /// Fetches every URL concurrently
    ///
    /// # Arguments
    /// * `urls` - Distinct URLs to fetch
    ///
    /// # Returns
    /// One `FetchResult` per URL, where `results[i]` belongs to `urls[i]` no matter
    /// in which order the requests complete. An empty input returns immediately.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<FetchResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        join_all(urls.iter().map(|url| self.fetch_one(url))).await
    }

    /// Fetches a single page, turning every error into a `Failure`
    async fn fetch_one(&self, url: &str) -> FetchResult {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return failure(url, describe_error(&e)),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return failure(url, format!("HTTP {}", status));
        }

        match response.text().await {
            Ok(text) => {
                debug!("OK {}", url);
                FetchResult::Success(text)
            }
            Err(e) => failure(url, format!("failed to read body: {}", describe_error(&e))),
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn failure(url: &str, reason: String) -> FetchResult {
    debug!("Failed {}: {}", url, reason);
    FetchResult::Failure(reason)
}

/// Names the kind of transport error ahead of reqwest's message
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else if e.is_builder() {
        format!("invalid request: {}", e)
    } else {
        e.to_string()
    }
}
