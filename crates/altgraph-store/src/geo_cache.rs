//! Geolocation cache persisted next to the identity snapshot
//!
//! The file keeps the upstream field names (`countryCode`, `regionName`) so
//! caches written by earlier tooling stay readable.

use crate::snapshot::{format_timestamp, parse_timestamp, write_atomically};
use crate::StoreError;
use altgraph_domain::{GeoInfo, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoCacheEntry {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    isp: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
    #[serde(default, rename = "last_updated")]
    last_updated: Option<String>,
}

impl GeoCacheEntry {
    fn new(info: GeoInfo, timestamp: Timestamp) -> Self {
        Self {
            country: info.country,
            country_code: info.country_code,
            region: info.region,
            region_name: info.region_name,
            city: info.city,
            isp: info.isp,
            org: info.org,
            proxy: info.proxy,
            hosting: info.hosting,
            last_updated: Some(format_timestamp(&timestamp)),
        }
    }

    fn info(&self) -> GeoInfo {
        GeoInfo {
            country: self.country.clone(),
            country_code: self.country_code.clone(),
            region: self.region.clone(),
            region_name: self.region_name.clone(),
            city: self.city.clone(),
            isp: self.isp.clone(),
            org: self.org.clone(),
            proxy: self.proxy,
            hosting: self.hosting,
        }
    }
}

/// IP → geolocation cache
#[derive(Debug, Clone, Default)]
pub struct GeoCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, GeoCacheEntry>,
}

impl GeoCache {
    /// Create an empty cache that is never persisted
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the cache at `path`
    ///
    /// A missing file is an empty cache. A corrupt file is logged and treated
    /// as empty: the cache only ever saves network calls.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Error loading IP geo data from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        tracing::info!("Loaded {} IP geo records", entries.len());
        Self {
            path: Some(path),
            entries,
        }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, GeoCacheEntry>, StoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Cache file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the cache to its path
    pub fn save(&self) -> Result<(), StoreError> {
        let path = self.path.as_deref().ok_or(StoreError::NoPath)?;
        let json = serde_json::to_string_pretty(&self.entries)?;
        write_atomically(path, &json)
    }

    /// Whether `ip` is cached
    pub fn contains(&self, ip: &str) -> bool {
        self.entries.contains_key(ip)
    }

    /// Cached info for `ip`
    pub fn get(&self, ip: &str) -> Option<GeoInfo> {
        self.entries.get(ip).map(GeoCacheEntry::info)
    }

    /// When `ip` was cached
    pub fn cached_at(&self, ip: &str) -> Option<Timestamp> {
        self.entries
            .get(ip)
            .and_then(|entry| entry.last_updated.as_deref())
            .and_then(|raw| parse_timestamp(raw).ok().flatten())
    }

    /// Cache `info` for `ip`
    pub fn insert(&mut self, ip: impl Into<String>, info: GeoInfo, timestamp: Timestamp) {
        self.entries.insert(ip.into(), GeoCacheEntry::new(info, timestamp));
    }

    /// The subset of `ips` not yet cached, in input order
    pub fn missing<'a, I>(&self, ips: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        ips.into_iter()
            .filter(|ip| !self.entries.contains_key(ip.as_str()))
            .cloned()
            .collect()
    }

    /// Number of cached IPs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
