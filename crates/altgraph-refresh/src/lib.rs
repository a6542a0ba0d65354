//! altgraph Refresh
//!
//! Keeps an identity store current by pulling evidence from a remote feed.
//!
//! # Overview
//!
//! The [`RefreshCoordinator`] is the only writer of its store. Each cycle:
//!
//! | Phase | What happens |
//! |-------|--------------|
//! | **Fetching** | GET the feed (reusing a batch fetched within the last few seconds) |
//! | **Quarantining** | Split off quarantined identities, when a policy is configured |
//! | **Merging** | Fold every batch record into a private copy of the store |
//! | **Overriding** | Re-read override rules and enforce them |
//! | **Enriching** | Look up geolocation for IPs missing from the cache |
//! | **Persisting** | Write the snapshot if anything changed |
//!
//! A failed fetch aborts the cycle before anything is merged. A failed
//! enrichment is only logged.
//!
//! # Background Worker
//!
//! [`RefreshWorker`] runs cycles on an interval until Ctrl+C. Interactive
//! front ends can also call [`RefreshCoordinator::note_lookup`], which
//! refreshes every few lookups.
//!
//! # Collaborators
//!
//! - [`HttpFeed`]: the remote feed over HTTP
//! - [`IpApiClient`]: batched, paced ip-api.com lookups
//! - [`MockFeed`] / [`MockGeo`]: deterministic stand-ins for testing
//!
//! # Configuration
//!
//! ```toml
//! [refresh]
//! feed_url = "https://example.com/alts.json"
//! feed_timeout_secs = 30
//! fetch_cache_ttl_secs = 5
//! interval_minutes = 60
//! lookups_per_refresh = 3
//! geo_enabled = true
//! geo_endpoint = "http://ip-api.com"
//! geo_batch_size = 100
//! geo_pacing_millis = 2000
//! ```

#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod feed;
mod geo;
mod metrics;
mod mock;
mod worker;

pub use config::{QuarantineConfig, RefreshConfig, DEFAULT_GEO_ENDPOINT, MAX_GEO_BATCH};
pub use coordinator::{LookupCounter, RefreshCoordinator, RefreshPhase};
pub use error::RefreshError;
pub use feed::{FetchCache, HttpFeed};
pub use geo::IpApiClient;
pub use metrics::{RefreshMetrics, RefreshReport};
pub use mock::{MockFeed, MockGeo};
pub use worker::RefreshWorker;
