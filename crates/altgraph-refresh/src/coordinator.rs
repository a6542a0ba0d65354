//! Refresh coordinator - the single writer for an identity store
//!
//! A cycle walks `Fetching → Quarantining → Merging → Overriding →
//! Enriching → Persisting`. Cycles are serialized by one lock held for the
//! whole cycle. Merge and override run on a private copy of the store that
//! is swapped in only once both succeed, so readers never see a half-applied
//! batch.

use crate::feed::FetchCache;
use crate::{RefreshConfig, RefreshError, RefreshMetrics, RefreshReport};
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_domain::{GeoInfo, GroupRecord, QuarantineSeed, RawBatch, Timestamp};
use altgraph_extractor::{parse_transcript_at, to_evidence};
use altgraph_resolver::{apply_overrides, merge_batch, merge_observation, OverrideSource, QuarantinePlan};
use altgraph_store::{GeoCache, IdentityStore, StoreStats};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Where a cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No cycle running
    Idle,
    /// Waiting on the remote feed
    Fetching,
    /// Partitioning the batch by quarantine policy
    Quarantining,
    /// Folding evidence into the store
    Merging,
    /// Applying override rules
    Overriding,
    /// Looking up geolocation for new IPs
    Enriching,
    /// Writing the snapshot
    Persisting,
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::Fetching => "fetching",
            RefreshPhase::Quarantining => "quarantining",
            RefreshPhase::Merging => "merging",
            RefreshPhase::Overriding => "overriding",
            RefreshPhase::Enriching => "enriching",
            RefreshPhase::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Counts lookups and signals every `threshold`-th one
///
/// A threshold of zero never signals.
#[derive(Debug)]
pub struct LookupCounter {
    threshold: u32,
    count: AtomicU32,
}

impl LookupCounter {
    /// Create a counter that fires every `threshold` lookups
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: AtomicU32::new(0),
        }
    }

    /// Count one lookup; true when the threshold was reached (the count restarts)
    pub fn record(&self) -> bool {
        if self.threshold == 0 {
            return false;
        }
        let seen = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if seen >= self.threshold {
            self.count.store(0, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Lookups since the last signal
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

/// State owned by whoever holds the cycle lock
struct CycleState {
    fetch_cache: FetchCache,
    metrics: RefreshMetrics,
}

/// Runs refresh cycles against one store
///
/// # Examples
///
/// ```no_run
/// use altgraph_refresh::{HttpFeed, IpApiClient, RefreshConfig, RefreshCoordinator};
/// use altgraph_store::{GeoCache, IdentityStore};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RefreshConfig {
///     feed_url: "https://example.com/alts.json".into(),
///     ..Default::default()
/// };
/// let coordinator = RefreshCoordinator::new(
///     config.clone(),
///     IdentityStore::open("alts_data.json")?,
///     GeoCache::open("ip_geo_data.json"),
///     HttpFeed::from_config(&config)?,
///     IpApiClient::from_config(&config)?,
/// );
///
/// let report = coordinator.refresh().await?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator<F, G> {
    config: RefreshConfig,
    feed: F,
    geo: G,
    quarantine: Option<QuarantineSeed>,
    overrides: Option<OverrideSource>,
    store: RwLock<IdentityStore>,
    geo_cache: Mutex<GeoCache>,
    cycle: Mutex<CycleState>,
    phase: watch::Sender<RefreshPhase>,
    lookups: LookupCounter,
}

impl<F, G> RefreshCoordinator<F, G>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    /// Create a coordinator owning `store` and `geo_cache`
    pub fn new(config: RefreshConfig, store: IdentityStore, geo_cache: GeoCache, feed: F, geo: G) -> Self {
        let (phase, _) = watch::channel(RefreshPhase::Idle);
        Self {
            cycle: Mutex::new(CycleState {
                fetch_cache: FetchCache::new(config.fetch_cache_ttl()),
                metrics: RefreshMetrics::new(),
            }),
            lookups: LookupCounter::new(config.lookups_per_refresh),
            config,
            feed,
            geo,
            quarantine: None,
            overrides: None,
            store: RwLock::new(store),
            geo_cache: Mutex::new(geo_cache),
            phase,
        }
    }

    /// Run the quarantine policy on every batch
    pub fn with_quarantine(mut self, seed: QuarantineSeed) -> Self {
        self.quarantine = Some(seed);
        self
    }

    /// Re-read override rules from `source` on every cycle
    pub fn with_overrides(mut self, source: OverrideSource) -> Self {
        self.overrides = Some(source);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// The phase of the running cycle
    pub fn phase(&self) -> RefreshPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<RefreshPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: RefreshPhase) {
        debug!("Refresh phase: {}", phase);
        self.phase.send_replace(phase);
    }

    /// Fetch the remote batch and run a full cycle
    ///
    /// A fetch or parse failure aborts the cycle before the store is touched.
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let mut state = self.cycle.lock().await;
        info!("Starting refresh cycle");

        self.enter(RefreshPhase::Fetching);
        let recent = state.fetch_cache.get().cloned();
        let (batch, cached) = match recent {
            Some(batch) => {
                info!("Using cached remote data (recent fetch)");
                (batch, true)
            }
            None => match self.feed.fetch().await {
                Ok(batch) => {
                    state.fetch_cache.put(batch.clone());
                    (batch, false)
                }
                Err(e) => {
                    self.enter(RefreshPhase::Idle);
                    state.metrics.record_failure();
                    error!("Failed to fetch or parse remote data: {}", e);
                    return Err(RefreshError::Feed(e.to_string()));
                }
            },
        };

        let result = self.run_batch(&batch, Utc::now(), cached).await;
        self.finish(&mut state, result)
    }

    /// Run a cycle on a locally supplied batch (no fetch)
    pub async fn ingest_batch(&self, batch: RawBatch) -> Result<RefreshReport, RefreshError> {
        let mut state = self.cycle.lock().await;
        info!("Ingesting local batch of {} records", batch.len());
        let result = self.run_batch(&batch, Utc::now(), false).await;
        self.finish(&mut state, result)
    }

    /// Parse and merge a transcript
    ///
    /// Text that is not a transcript yields `Ok(None)` and changes nothing.
    pub async fn ingest_transcript(&self, text: &str) -> Result<Option<RefreshReport>, RefreshError> {
        let timestamp = Utc::now();
        let Some(parsed) = parse_transcript_at(text, timestamp) else {
            debug!("Text is not an alt transcript; ignoring");
            return Ok(None);
        };
        let main = parsed.main.clone();

        let mut state = self.cycle.lock().await;
        let mut working = self.store.read().await.clone();

        self.enter(RefreshPhase::Merging);
        let observation = to_evidence(parsed).into_observation();
        let outcome = merge_observation(&mut working, &observation);

        self.enter(RefreshPhase::Overriding);
        let overrides_changed = self.apply_current_overrides(&mut working, timestamp);

        *self.store.write().await = working;
        info!("Updated alts data for group starting with {}", main);

        let mut report = RefreshReport {
            group_updates: outcome.observations,
            overrides_changed,
            ..Default::default()
        };
        let result = self.persist_phase().await.map(|persisted| {
            report.persisted = persisted;
            report
        });
        self.finish(&mut state, result).map(Some)
    }

    /// Write the snapshot now; returns false for stores with no path
    pub async fn persist(&self) -> Result<bool, RefreshError> {
        let _state = self.cycle.lock().await;
        let result = self.persist_phase().await;
        self.enter(RefreshPhase::Idle);
        result
    }

    /// Run a housekeeping pass over the store and persist it if it changed
    ///
    /// The pass runs on a copy, like a refresh cycle.
    pub async fn maintain<R, P>(&self, pass: P) -> Result<R, RefreshError>
    where
        P: FnOnce(&mut IdentityStore) -> R,
    {
        let _state = self.cycle.lock().await;
        let mut working = self.store.read().await.clone();
        let result = pass(&mut working);

        let changed = {
            let mut store = self.store.write().await;
            let changed = *store != working;
            *store = working;
            changed
        };
        if changed {
            let persisted = self.persist_phase().await;
            self.enter(RefreshPhase::Idle);
            persisted?;
        }
        Ok(result)
    }

    /// A copy of the current store
    pub async fn snapshot(&self) -> IdentityStore {
        self.store.read().await.clone()
    }

    /// Find an identity (exact, then case-insensitive)
    pub async fn lookup(&self, name: &str) -> Option<(String, GroupRecord)> {
        self.store
            .read()
            .await
            .find(name)
            .map(|(key, record)| (key.clone(), record.clone()))
    }

    /// Count a user-facing lookup and refresh when the threshold is reached
    ///
    /// Returns the report of the triggered refresh, if any. A failed
    /// refresh is logged and not propagated.
    pub async fn note_lookup(&self) -> Option<RefreshReport> {
        if !self.lookups.record() {
            return None;
        }
        info!(
            "Auto-refreshing remote alts database ({} lookups used)",
            self.config.lookups_per_refresh
        );
        match self.refresh().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Automatic refresh failed: {}", e);
                None
            }
        }
    }

    /// Summary counts for the current store
    pub async fn stats(&self) -> StoreStats {
        self.store.read().await.stats()
    }

    /// Cached geolocation for each of `ips` that has one
    pub async fn geo_for<'a, I>(&self, ips: I) -> BTreeMap<String, GeoInfo>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let cache = self.geo_cache.lock().await;
        ips.into_iter()
            .filter_map(|ip| cache.get(ip).map(|info| (ip.clone(), info)))
            .collect()
    }

    /// Number of cached geolocation records
    pub async fn geo_cache_len(&self) -> usize {
        self.geo_cache.lock().await.len()
    }

    /// Metrics accumulated so far (waits for a running cycle)
    pub async fn metrics(&self) -> RefreshMetrics {
        self.cycle.lock().await.metrics.clone()
    }

    /// Reset accumulated metrics
    pub async fn reset_metrics(&self) {
        self.cycle.lock().await.metrics.reset();
    }

    async fn run_batch(
        &self,
        batch: &RawBatch,
        timestamp: Timestamp,
        cached_fetch: bool,
    ) -> Result<RefreshReport, RefreshError> {
        let mut report = RefreshReport {
            cached_fetch,
            ..Default::default()
        };
        let mut working = self.store.read().await.clone();

        let plan = self.quarantine.as_ref().map(|seed| {
            self.enter(RefreshPhase::Quarantining);
            QuarantinePlan::build(batch, seed)
        });

        self.enter(RefreshPhase::Merging);
        let to_merge = plan.as_ref().map_or(batch, |plan| &plan.filtered_batch);
        let outcome = merge_batch(&mut working, to_merge, timestamp);
        report.group_updates = outcome.observations;
        info!(
            "Merged {} records ({} new identities, {} grown)",
            outcome.observations, outcome.created, outcome.updated
        );

        let mut isolated = false;
        if let Some(plan) = &plan {
            isolated = plan.apply_isolation(&mut working, timestamp);
            report.quarantined = plan.final_group().len();
        }

        self.enter(RefreshPhase::Overriding);
        report.overrides_changed = self.apply_current_overrides(&mut working, timestamp);

        *self.store.write().await = working;

        report.geo_added = self.enrich_phase().await;

        if outcome.merged_any() || isolated || report.overrides_changed {
            report.persisted = self.persist_phase().await?;
        } else {
            debug!("Nothing changed; skipping snapshot write");
        }
        Ok(report)
    }

    fn apply_current_overrides(&self, store: &mut IdentityStore, timestamp: Timestamp) -> bool {
        let Some(source) = &self.overrides else {
            return false;
        };
        let rules = source.load();
        if rules.is_empty() {
            return false;
        }
        apply_overrides(store, &rules, timestamp)
    }

    async fn enrich_phase(&self) -> usize {
        if !self.config.geo_enabled {
            return 0;
        }
        let ips = self.store.read().await.all_ips();
        // Released across the lookup; `cycle` serializes cache writers.
        let missing = self.geo_cache.lock().await.missing(&ips);
        if missing.is_empty() {
            return 0;
        }

        self.enter(RefreshPhase::Enriching);
        info!("Fetching geo data for {} new IPs", missing.len());
        let found = match self.geo.fetch_batch(&missing).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Geo enrichment failed: {}", e);
                return 0;
            }
        };

        let now = Utc::now();
        let added = found.len();
        let mut cache = self.geo_cache.lock().await;
        for (ip, info) in found {
            cache.insert(ip, info, now);
        }
        if added > 0 && cache.path().is_some() {
            if let Err(e) = cache.save() {
                warn!("Failed to save IP geo data: {}", e);
            }
        }
        added
    }

    async fn persist_phase(&self) -> Result<bool, RefreshError> {
        let store = self.store.read().await;
        if store.path().is_none() {
            debug!("Store has no snapshot path; skipping write");
            return Ok(false);
        }
        self.enter(RefreshPhase::Persisting);
        store.save()?;
        Ok(true)
    }

    fn finish(
        &self,
        state: &mut CycleState,
        result: Result<RefreshReport, RefreshError>,
    ) -> Result<RefreshReport, RefreshError> {
        self.enter(RefreshPhase::Idle);
        match &result {
            Ok(report) => {
                state.metrics.record_cycle(report);
                info!("Refresh cycle complete: {}", report.summary());
            }
            Err(e) => {
                state.metrics.record_failure();
                error!("Refresh cycle failed: {}", e);
            }
        }
        result
    }
}
