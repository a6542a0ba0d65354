//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;
use std::io::Read;

/// Read a transcript from a file, or stdin for `-`
pub fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

/// Merge transcript text into the store.
pub async fn ingest_text<F, G>(
    text: &str,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    match coordinator.ingest_transcript(text).await? {
        Some(report) => {
            println!("{}", formatter.format_report(&report)?);
            Ok(())
        }
        None => Err(CliError::InvalidInput(
            "no \"<user> has N alts:\" transcript found in input".to_string(),
        )),
    }
}

/// Execute the ingest command.
pub async fn execute_ingest<F, G>(
    args: IngestArgs,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let text = read_source(&args.source)?;
    ingest_text(&text, coordinator, formatter).await
}
