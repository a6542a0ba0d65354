//! Deterministic feed and geolocation collaborators for testing
//!
//! Neither makes network calls. Both count how often they are called.

use crate::RefreshError;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_domain::{GeoInfo, RawBatch};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Feed that serves a configured batch, or fails
///
/// # Examples
///
/// ```
/// use altgraph_domain::RawBatch;
/// use altgraph_refresh::MockFeed;
///
/// let mut batch = RawBatch::new();
/// batch.insert("1.2.3.4".into(), vec!["alice".into()]);
/// let feed = MockFeed::new(batch);
/// assert_eq!(feed.call_count(), 0);
///
/// feed.fail();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFeed {
    batch: Arc<Mutex<Option<RawBatch>>>,
    calls: Arc<AtomicUsize>,
}

impl MockFeed {
    /// A feed that always returns `batch`
    pub fn new(batch: RawBatch) -> Self {
        Self {
            batch: Arc::new(Mutex::new(Some(batch))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A feed whose every fetch fails
    pub fn failing() -> Self {
        Self::default()
    }

    /// Serve `batch` from now on
    pub fn set_batch(&self, batch: RawBatch) {
        *lock(&self.batch) = Some(batch);
    }

    /// Fail every fetch from now on
    pub fn fail(&self) {
        *lock(&self.batch) = None;
    }

    /// Number of fetches so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for MockFeed {
    type Error = RefreshError;

    async fn fetch(&self) -> Result<RawBatch, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.batch)
            .clone()
            .ok_or_else(|| RefreshError::Feed("Mock feed failure".to_string()))
    }
}

/// Geolocation lookup that resolves from a fixed table
///
/// IPs absent from the table are resolved with `fallback` when one is
/// set, and left out of the result otherwise.
#[derive(Debug, Clone, Default)]
pub struct MockGeo {
    known: Arc<Mutex<BTreeMap<String, GeoInfo>>>,
    fallback: Option<GeoInfo>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockGeo {
    /// A lookup that resolves nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// A lookup that resolves every IP to `info`
    pub fn resolving_all(info: GeoInfo) -> Self {
        Self {
            fallback: Some(info),
            ..Self::default()
        }
    }

    /// Resolve `ip` to `info`
    pub fn add_entry(&self, ip: impl Into<String>, info: GeoInfo) {
        lock(&self.known).insert(ip.into(), info);
    }

    /// Make every lookup fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of lookups so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every IP asked about, in request order
    pub fn requested(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

impl GeoLookup for MockGeo {
    type Error = RefreshError;

    async fn fetch_batch(&self, ips: &[String]) -> Result<BTreeMap<String, GeoInfo>, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requested).extend(ips.iter().cloned());
        if self.failing.load(Ordering::SeqCst) {
            return Err(RefreshError::Feed("Mock geo failure".to_string()));
        }

        let known = lock(&self.known);
        Ok(ips
            .iter()
            .filter_map(|ip| {
                known
                    .get(ip)
                    .or(self.fallback.as_ref())
                    .map(|info| (ip.clone(), info.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_feed() {
        let mut batch = RawBatch::new();
        batch.insert("k".into(), vec!["a".into()]);
        let feed = MockFeed::new(batch.clone());

        assert_eq!(feed.fetch().await.unwrap(), batch);
        feed.fail();
        assert!(feed.fetch().await.is_err());
        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_geo_table_and_fallback() {
        let geo = MockGeo::new();
        geo.add_entry("1.1.1.1", GeoInfo::default());
        let ips = vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()];
        assert_eq!(geo.fetch_batch(&ips).await.unwrap().len(), 1);

        let everything = MockGeo::resolving_all(GeoInfo::default());
        assert_eq!(everything.fetch_batch(&ips).await.unwrap().len(), 2);
        assert_eq!(everything.requested(), ips);
    }

    #[tokio::test]
    async fn test_mock_geo_failing() {
        let geo = MockGeo::resolving_all(GeoInfo::default());
        geo.set_failing(true);
        assert!(geo.fetch_batch(&["1.1.1.1".to_string()]).await.is_err());
        assert_eq!(geo.call_count(), 1);
    }
}
