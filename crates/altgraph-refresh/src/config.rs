//! Configuration for refresh cycles
//!
//! Controls where evidence comes from, how often it is fetched, and how the
//! results are enriched.

use crate::RefreshError;
use altgraph_domain::{is_valid_ip, QuarantineSeed};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ip-api.com endpoint
pub const DEFAULT_GEO_ENDPOINT: &str = "http://ip-api.com";

/// Largest batch ip-api.com accepts
pub const MAX_GEO_BATCH: usize = 100;

/// Configuration for the refresh coordinator and worker
///
/// # Examples
///
/// ```
/// use altgraph_refresh::RefreshConfig;
///
/// let config = RefreshConfig::default();
/// assert_eq!(config.fetch_cache_ttl_secs, 5);
/// assert_eq!(config.geo_batch_size, 100);
///
/// // No background refreshes, no lookup-triggered refreshes
/// let config = RefreshConfig::manual();
/// assert_eq!(config.lookups_per_refresh, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// URL of the remote feed (empty disables fetching)
    pub feed_url: String,

    /// Request timeout for the feed
    /// Default: 30 seconds
    pub feed_timeout_secs: u64,

    /// How long a fetched batch is reused by back-to-back refreshes
    /// Default: 5 seconds
    pub fetch_cache_ttl_secs: u64,

    /// Interval between background refreshes (in minutes)
    /// Default: 60 minutes
    pub interval_minutes: u64,

    /// Lookups that trigger an automatic refresh (0 disables)
    /// Default: 3
    pub lookups_per_refresh: u32,

    /// Look up geolocation for newly seen IPs
    /// Default: true
    pub geo_enabled: bool,

    /// Base URL of the ip-api compatible geolocation service
    pub geo_endpoint: String,

    /// IPs per geolocation request (at most 100)
    pub geo_batch_size: usize,

    /// Pause between geolocation requests (in milliseconds)
    /// Default: 2000
    pub geo_pacing_millis: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            feed_timeout_secs: 30,
            fetch_cache_ttl_secs: 5,
            interval_minutes: 60,
            lookups_per_refresh: 3,
            geo_enabled: true,
            geo_endpoint: DEFAULT_GEO_ENDPOINT.to_string(),
            geo_batch_size: MAX_GEO_BATCH,
            geo_pacing_millis: 2000,
        }
    }
}

impl RefreshConfig {
    /// Refresh only when asked: no lookup-triggered refreshes and a daily interval
    pub fn manual() -> Self {
        Self {
            interval_minutes: 24 * 60,
            lookups_per_refresh: 0,
            ..Self::default()
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), RefreshError> {
        if !self.feed_url.is_empty()
            && !(self.feed_url.starts_with("http://") || self.feed_url.starts_with("https://"))
        {
            return Err(RefreshError::Config(format!(
                "feed_url must be an http(s) URL, got '{}'",
                self.feed_url
            )));
        }
        if self.feed_timeout_secs == 0 {
            return Err(RefreshError::Config("feed_timeout_secs must be positive".into()));
        }
        if self.interval_minutes == 0 {
            return Err(RefreshError::Config("interval_minutes must be positive".into()));
        }
        if self.geo_batch_size == 0 || self.geo_batch_size > MAX_GEO_BATCH {
            return Err(RefreshError::Config(format!(
                "geo_batch_size must be between 1 and {}",
                MAX_GEO_BATCH
            )));
        }
        Ok(())
    }

    /// Parse from TOML
    pub fn from_toml(text: &str) -> Result<Self, RefreshError> {
        let config: Self = toml::from_str(text).map_err(|e| RefreshError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, RefreshError> {
        toml::to_string_pretty(self).map_err(|e| RefreshError::Config(e.to_string()))
    }

    /// Get the feed timeout as Duration
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    /// Get the fetch cache TTL as Duration
    pub fn fetch_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fetch_cache_ttl_secs)
    }

    /// Get the refresh interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    /// Get the geolocation pacing as Duration
    pub fn geo_pacing(&self) -> Duration {
        Duration::from_millis(self.geo_pacing_millis)
    }
}

/// Quarantine policy as written in configuration
///
/// ```toml
/// [quarantine]
/// enabled = true
/// seed_identities = ["Spigey"]
/// seed_prefixes = ["..."]
/// trusted_ips = ["193.32.248.162"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Whether the policy runs during refreshes
    pub enabled: bool,
    /// Identities always quarantined
    pub seed_identities: Vec<String>,
    /// Members starting with one of these are quarantined
    pub seed_prefixes: Vec<String>,
    /// IPs the quarantined group may carry
    pub trusted_ips: Vec<String>,
}

impl QuarantineConfig {
    /// Reject trusted IPs that are not addresses
    pub fn validate(&self) -> Result<(), RefreshError> {
        if let Some(bad) = self.trusted_ips.iter().find(|ip| !is_valid_ip(ip)) {
            return Err(RefreshError::Config(format!("trusted IP '{}' is not a valid address", bad)));
        }
        if self.enabled && self.seed_identities.is_empty() && self.seed_prefixes.iter().all(String::is_empty) {
            return Err(RefreshError::Config(
                "quarantine is enabled but has no seed identities or prefixes".into(),
            ));
        }
        Ok(())
    }

    /// The seed to run with, or `None` when disabled
    pub fn seed(&self) -> Option<QuarantineSeed> {
        if !self.enabled {
            return None;
        }
        Some(
            QuarantineSeed::new(self.seed_identities.iter().cloned(), self.trusted_ips.iter().cloned())
                .with_prefixes(self.seed_prefixes.iter().cloned()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::default();
        assert!(config.feed_url.is_empty());
        assert_eq!(config.feed_timeout(), Duration::from_secs(30));
        assert_eq!(config.fetch_cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.geo_pacing(), Duration::from_secs(2));
        assert_eq!(config.lookups_per_refresh, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_manual_config() {
        let config = RefreshConfig::manual();
        assert_eq!(config.lookups_per_refresh, 0);
        assert!(config.interval() > RefreshConfig::default().interval());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = RefreshConfig {
            feed_url: "ftp://example.com/alts.json".into(),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let big_batch = RefreshConfig {
            geo_batch_size: 500,
            ..Default::default()
        };
        assert!(big_batch.validate().is_err());

        let zero_interval = RefreshConfig {
            interval_minutes: 0,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RefreshConfig::from_toml(
            r#"
            feed_url = "https://example.com/alts.json"
            geo_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.feed_url, "https://example.com/alts.json");
        assert!(!config.geo_enabled);
        assert_eq!(config.fetch_cache_ttl_secs, 5);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RefreshConfig::manual();
        let text = config.to_toml().unwrap();
        assert_eq!(RefreshConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_quarantine_seed() {
        let config = QuarantineConfig {
            enabled: true,
            seed_identities: vec!["X".into()],
            seed_prefixes: vec!["...".into()],
            trusted_ips: vec!["193.32.248.162".into()],
        };
        assert!(config.validate().is_ok());
        let seed = config.seed().unwrap();
        assert!(seed.identities.contains("X"));
        assert!(seed.matches_prefix("...ghost"));
        assert_eq!(seed.trusted_ips.len(), 1);

        let disabled = QuarantineConfig::default();
        assert!(disabled.seed().is_none());
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_quarantine_rejects_bad_trusted_ip() {
        let config = QuarantineConfig {
            trusted_ips: vec!["nope".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
