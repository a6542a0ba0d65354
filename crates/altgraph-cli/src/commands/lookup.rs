//! Lookup command implementation.

use crate::cli::LookupArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;

/// Execute the lookup command.
///
/// Every name counts toward the coordinator's lookup-triggered refresh.
/// Fails only when none of the names is known.
pub async fn execute_lookup<F, G>(
    args: LookupArgs,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let mut missing = Vec::new();
    let mut sections = Vec::new();

    for name in &args.names {
        if let Some(report) = coordinator.note_lookup().await {
            tracing::info!("Remote data refreshed: {}", report.summary());
        }

        match coordinator.lookup(name).await {
            Some((identity, record)) => {
                let geo = coordinator.geo_for(&record.ips).await;
                sections.push(formatter.format_group(&identity, &record, &geo)?);
            }
            None => {
                eprintln!("{}", formatter.warning(&format!("No alts data found for {}", name)));
                missing.push(name.clone());
            }
        }
    }

    if sections.is_empty() {
        return Err(CliError::NotFound(missing.join(", ")));
    }
    println!("{}", sections.join("\n\n"));
    Ok(())
}
