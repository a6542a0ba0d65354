//! Background worker for periodic refreshes

use crate::{RefreshCoordinator, RefreshError, RefreshMetrics};
use altgraph_domain::traits::{FeedSource, GeoLookup};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs refresh cycles on a schedule
///
/// The coordinator is shared, so lookups and manual refreshes can run
/// against it while the worker is alive.
///
/// # Examples
///
/// ```no_run
/// use altgraph_refresh::{HttpFeed, IpApiClient, RefreshConfig, RefreshCoordinator, RefreshWorker};
/// use altgraph_store::{GeoCache, IdentityStore};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RefreshConfig::default();
///     let coordinator = Arc::new(RefreshCoordinator::new(
///         config.clone(),
///         IdentityStore::open("alts_data.json")?,
///         GeoCache::open("ip_geo_data.json"),
///         HttpFeed::from_config(&config)?,
///         IpApiClient::from_config(&config)?,
///     ));
///
///     // Run indefinitely (until Ctrl+C)
///     RefreshWorker::new(coordinator).run().await?;
///     Ok(())
/// }
/// ```
pub struct RefreshWorker<F, G> {
    coordinator: Arc<RefreshCoordinator<F, G>>,
    interval: Duration,
}

impl<F, G> RefreshWorker<F, G>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    /// Create a worker using the coordinator's configured interval
    pub fn new(coordinator: Arc<RefreshCoordinator<F, G>>) -> Self {
        let interval = coordinator.config().interval();
        Self::with_interval(coordinator, interval)
    }

    /// Create a worker with an explicit interval
    pub fn with_interval(coordinator: Arc<RefreshCoordinator<F, G>>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// The shared coordinator
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator<F, G>> {
        &self.coordinator
    }

    /// Run until a shutdown signal (Ctrl+C) is received
    ///
    /// Failed cycles are logged; the worker keeps going.
    pub async fn run(&self) -> Result<(), RefreshError> {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Refresh worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.coordinator.refresh().await {
                        Ok(report) => tracing::info!("Refresh completed: {}", report.summary()),
                        Err(e) => tracing::error!("Refresh failed: {}", e),
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        return Err(RefreshError::Worker(format!("Failed to listen for shutdown: {}", e)));
                    }
                    tracing::info!("Shutdown signal received, stopping refresh worker");
                    break;
                }
            }
        }

        let metrics = self.coordinator.metrics().await;
        tracing::info!("Refresh worker stopped. Final metrics:\n{}", metrics.summary());
        Ok(())
    }

    /// Run a fixed number of cycles, stopping at the first failure
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), RefreshError> {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Refresh worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting refresh cycle {}/{}", cycle + 1, cycles);

            match self.coordinator.refresh().await {
                Ok(report) => {
                    tracing::info!("Refresh {}/{} completed: {}", cycle + 1, cycles, report.summary());
                }
                Err(e) => {
                    tracing::error!("Refresh {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        let metrics = self.coordinator.metrics().await;
        tracing::info!("Refresh worker finished {} cycles. Final metrics:\n{}", cycles, metrics.summary());
        Ok(())
    }

    /// Metrics accumulated by the coordinator
    pub async fn metrics(&self) -> RefreshMetrics {
        self.coordinator.metrics().await
    }

    /// Reset the coordinator's metrics counters
    pub async fn reset_metrics(&self) {
        self.coordinator.reset_metrics().await;
    }
}
