//! ip-api.com batch geolocation client

use crate::config::{DEFAULT_GEO_ENDPOINT, MAX_GEO_BATCH};
use crate::{RefreshConfig, RefreshError};
use altgraph_domain::traits::GeoLookup;
use altgraph_domain::GeoInfo;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const FIELDS: &str = "query,status,country,countryCode,region,regionName,city,isp,org,as,proxy,hosting";

/// Default timeout for one geolocation batch request
pub const DEFAULT_GEO_TIMEOUT_SECS: u64 = 10;

/// One element of the ip-api batch response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiRecord {
    query: Option<String>,
    status: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

impl IpApiRecord {
    fn into_entry(self) -> Option<(String, GeoInfo)> {
        if self.status.as_deref() != Some("success") {
            return None;
        }
        let ip = self.query?;
        Some((
            ip,
            GeoInfo {
                country: self.country,
                country_code: self.country_code,
                region: self.region,
                region_name: self.region_name,
                city: self.city,
                isp: self.isp,
                org: self.org,
                proxy: self.proxy,
                hosting: self.hosting,
            },
        ))
    }
}

/// Batched, paced client for the ip-api.com `/batch` endpoint
#[derive(Debug, Clone)]
pub struct IpApiClient {
    endpoint: String,
    client: reqwest::Client,
    batch_size: usize,
    pacing: Duration,
}

impl IpApiClient {
    /// Create a client for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_GEO_TIMEOUT_SECS))
            .build()
            .map_err(|e| RefreshError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
            batch_size: MAX_GEO_BATCH,
            pacing: Duration::from_secs(2),
        })
    }

    /// Create a client against the public ip-api.com endpoint
    pub fn default_endpoint() -> Result<Self, RefreshError> {
        Self::new(DEFAULT_GEO_ENDPOINT)
    }

    /// Create a client from configuration
    pub fn from_config(config: &RefreshConfig) -> Result<Self, RefreshError> {
        Ok(Self::new(config.geo_endpoint.clone())?
            .with_batch_size(config.geo_batch_size)
            .with_pacing(config.geo_pacing()))
    }

    /// Set the number of IPs per request (clamped to 1..=100)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_GEO_BATCH);
        self
    }

    /// Set the pause between requests
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    async fn fetch_chunk(&self, chunk: &[String]) -> Result<BTreeMap<String, GeoInfo>, RefreshError> {
        let url = format!("{}/batch?fields={}", self.endpoint, FIELDS);
        let response = self
            .client
            .post(&url)
            .json(chunk)
            .send()
            .await
            .map_err(|e| RefreshError::Feed(format!("Geo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Feed(format!("Geo lookup returned HTTP {}", status)));
        }

        let records: Vec<IpApiRecord> = response
            .json()
            .await
            .map_err(|e| RefreshError::Feed(format!("Invalid geo response: {}", e)))?;
        Ok(records.into_iter().filter_map(IpApiRecord::into_entry).collect())
    }
}

impl GeoLookup for IpApiClient {
    type Error = RefreshError;

    /// Failed batches are logged and skipped; the rest still count
    async fn fetch_batch(&self, ips: &[String]) -> Result<BTreeMap<String, GeoInfo>, RefreshError> {
        let mut results = BTreeMap::new();
        let batches = ips.len().div_ceil(self.batch_size);

        for (idx, chunk) in ips.chunks(self.batch_size).enumerate() {
            if idx > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            match self.fetch_chunk(chunk).await {
                Ok(found) => {
                    debug!("Geo batch {}/{}: {} of {} resolved", idx + 1, batches, found.len(), chunk.len());
                    results.extend(found);
                }
                Err(e) => warn!("Geo batch {}/{} failed: {}", idx + 1, batches, e),
            }
        }
        Ok(results)
    }
}
