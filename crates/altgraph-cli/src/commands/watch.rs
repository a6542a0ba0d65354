//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::{RefreshCoordinator, RefreshWorker};
use std::sync::Arc;
use std::time::Duration;

/// Execute the watch command.
///
/// Runs until Ctrl+C, or for `--cycles` cycles.
pub async fn execute_watch<F, G>(
    args: WatchArgs,
    coordinator: Arc<RefreshCoordinator<F, G>>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let worker = match args.interval {
        Some(0) => {
            return Err(CliError::InvalidInput("interval must be at least 1 minute".into()));
        }
        Some(minutes) => RefreshWorker::with_interval(coordinator, Duration::from_secs(minutes * 60)),
        None => RefreshWorker::new(coordinator),
    };

    eprintln!("{}", formatter.info("Watching remote feed (Ctrl+C to stop)"));
    match args.cycles {
        Some(cycles) => worker.run_cycles(cycles).await?,
        None => worker.run().await?,
    }

    let metrics = worker.metrics().await;
    println!("{}", formatter.success(&format!(
        "{} cycles, {} failures, {} group updates",
        metrics.cycle_count, metrics.failure_count, metrics.group_updates
    )));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{coordinator, with_feed};
    use crate::config::OutputFormat;
    use altgraph_refresh::MockFeed;

    #[tokio::test]
    async fn test_watch_single_cycle() {
        let coordinator = Arc::new(coordinator(&[("1.2.3.4", &["alice"])]));
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let args = WatchArgs {
            interval: None,
            cycles: Some(1),
        };

        execute_watch(args, coordinator.clone(), &formatter).await.unwrap();
        assert_eq!(coordinator.metrics().await.cycle_count, 1);
        assert!(coordinator.lookup("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_watch_stops_on_failure() {
        let coordinator = Arc::new(with_feed(MockFeed::failing()));
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let args = WatchArgs {
            interval: Some(1),
            cycles: Some(3),
        };

        assert!(execute_watch(args, coordinator, &formatter).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let coordinator = Arc::new(coordinator(&[]));
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let args = WatchArgs {
            interval: Some(0),
            cycles: Some(1),
        };

        let err = execute_watch(args, coordinator, &formatter).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }
}
