//! Import command implementation.

use crate::cli::ImportArgs;
use crate::error::Result;
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_extractor::parse_batch;
use altgraph_refresh::RefreshCoordinator;

/// Execute the import command.
///
/// The file has the remote feed's shape and runs through a full cycle
/// (quarantine, merge, overrides, enrichment) without a fetch.
pub async fn execute_import<F, G>(
    args: ImportArgs,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let text = std::fs::read_to_string(&args.file)?;
    let batch = parse_batch(&text)?;
    tracing::info!("Importing {} records from {}", batch.len(), args.file.display());

    let report = coordinator.ingest_batch(batch).await?;
    println!("{}", formatter.format_report(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::coordinator;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_batch_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("raw.json");
        std::fs::write(&file, r#"{"1.2.3.4": ["alice", "bob"], "5.6.7.8": ["bob", "carol"]}"#).unwrap();

        let coordinator = coordinator(&[]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_import(ImportArgs { file }, &coordinator, &formatter)
            .await
            .unwrap();

        let (_, carol) = coordinator.lookup("carol").await.unwrap();
        assert_eq!(carol.alts.len(), 3);
        assert_eq!(carol.ips.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_batch_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("raw.json");
        std::fs::write(&file, r#"{"1.2.3.4": "alice"}"#).unwrap();

        let coordinator = coordinator(&[]);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let err = execute_import(ImportArgs { file }, &coordinator, &formatter)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Extractor(_)));
        assert!(coordinator.snapshot().await.is_empty());
    }
}
