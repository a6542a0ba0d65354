//! Refresh command implementation.

use crate::error::Result;
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;

/// Execute the refresh command.
pub async fn execute_refresh<F, G>(
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let report = coordinator.refresh().await?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}
