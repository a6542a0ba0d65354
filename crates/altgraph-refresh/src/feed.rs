//! Remote feed client and the short-lived fetch cache

use crate::{RefreshConfig, RefreshError};
use altgraph_domain::traits::FeedSource;
use altgraph_domain::RawBatch;
use altgraph_extractor::parse_batch;
use std::time::{Duration, Instant};
use tracing::debug;

/// Fetches `identifier -> [members]` batches over HTTP
///
/// # Examples
///
/// ```no_run
/// use altgraph_refresh::{HttpFeed, RefreshConfig};
///
/// let config = RefreshConfig {
///     feed_url: "https://example.com/alts.json".into(),
///     ..Default::default()
/// };
/// let feed = HttpFeed::from_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    /// Create a feed client for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a feed client from configuration
    pub fn from_config(config: &RefreshConfig) -> Result<Self, RefreshError> {
        Self::new(config.feed_url.clone(), config.feed_timeout())
    }

    /// The feed URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeed {
    type Error = RefreshError;

    async fn fetch(&self) -> Result<RawBatch, RefreshError> {
        if self.url.is_empty() {
            return Err(RefreshError::Config("No feed URL configured".into()));
        }
        debug!("Fetching remote data from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RefreshError::Feed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Feed(format!("HTTP {} from {}", status, self.url)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Feed(format!("Failed to read response: {}", e)))?;
        Ok(parse_batch(&body)?)
    }
}

/// Reuses the last fetched batch for a short window
///
/// Coalesces bursts of manual refreshes into one network call. It holds
/// no authority over the store and can be cleared at any time.
#[derive(Debug, Clone)]
pub struct FetchCache {
    ttl: Duration,
    last: Option<(Instant, RawBatch)>,
}

impl FetchCache {
    /// Create an empty cache with the given lifetime
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, last: None }
    }

    /// The cached batch, if it is still fresh
    pub fn get(&self) -> Option<&RawBatch> {
        self.last
            .as_ref()
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, batch)| batch)
    }

    /// Remember a freshly fetched batch
    pub fn put(&mut self, batch: RawBatch) {
        self.last = Some((Instant::now(), batch));
    }

    /// Forget the cached batch
    pub fn clear(&mut self) {
        self.last = None;
    }
}
