//! Stats command implementation.

use crate::error::Result;
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;

/// Execute the stats command.
pub async fn execute_stats<F, G>(
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let store = coordinator.snapshot().await;
    let violations = store.closure_violations();
    if !violations.is_empty() {
        tracing::warn!("{} closure violations in the store", violations.len());
    }

    println!(
        "{}",
        formatter.format_stats(&store.stats(), coordinator.geo_cache_len().await, violations.len())?
    );
    Ok(())
}
