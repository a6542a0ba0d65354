//! Command implementations.
//!
//! Commands that touch the store take a [`RefreshCoordinator`], generic over
//! its collaborators, so they run unchanged against the HTTP clients or the
//! in-crate mocks.

pub mod clean;
pub mod import;
pub mod ingest;
pub mod list;
pub mod lookup;
pub mod overrides;
pub mod refresh;
pub mod stats;
pub mod watch;

pub use self::clean::execute_clean;
pub use self::import::execute_import;
pub use self::ingest::execute_ingest;
pub use self::list::execute_list;
pub use self::lookup::execute_lookup;
pub use self::overrides::execute_overrides;
pub use self::refresh::execute_refresh;
pub use self::stats::execute_stats;
pub use self::watch::execute_watch;

use crate::config::Config;
use crate::error::Result;
use altgraph_refresh::{HttpFeed, IpApiClient, RefreshCoordinator};
use altgraph_resolver::OverrideSource;
use altgraph_store::{GeoCache, IdentityStore};

/// The coordinator the binary runs with
pub type Coordinator = RefreshCoordinator<HttpFeed, IpApiClient>;

/// Open the store and geo cache under the data directory and wire up the
/// HTTP collaborators, overrides and quarantine policy from `config`
pub fn open_coordinator(config: &Config) -> Result<Coordinator> {
    let store = IdentityStore::open(config.snapshot_path())?;
    let geo_cache = GeoCache::open(config.geo_cache_path());
    let feed = HttpFeed::from_config(&config.refresh)?;
    let geo = IpApiClient::from_config(&config.refresh)?;

    let mut coordinator = RefreshCoordinator::new(config.refresh.clone(), store, geo_cache, feed, geo)
        .with_overrides(OverrideSource::new(config.overrides_path()));
    if let Some(seed) = config.quarantine.seed() {
        tracing::debug!("Quarantine policy enabled");
        coordinator = coordinator.with_quarantine(seed);
    }
    Ok(coordinator)
}
