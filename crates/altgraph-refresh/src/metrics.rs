//! Reports and running metrics for refresh cycles

use serde::Serialize;

/// What a single refresh cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Batch records (or transcripts) merged into the store
    pub group_updates: usize,
    /// Whether override rules changed any record
    pub overrides_changed: bool,
    /// IPs newly added to the geolocation cache
    pub geo_added: usize,
    /// Whether the snapshot was written
    pub persisted: bool,
    /// Size of the quarantine group written this cycle (0 when no policy ran)
    pub quarantined: usize,
    /// Whether the batch came from the short-lived fetch cache
    pub cached_fetch: bool,
}

impl RefreshReport {
    /// One-line description for logs
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} group updates, overrides {}, {} new geo records, {}",
            self.group_updates,
            if self.overrides_changed { "changed" } else { "unchanged" },
            self.geo_added,
            if self.persisted { "saved" } else { "not saved" },
        );
        if self.quarantined > 0 {
            line.push_str(&format!(", {} quarantined", self.quarantined));
        }
        if self.cached_fetch {
            line.push_str(" (cached feed)");
        }
        line
    }
}

/// Metrics accumulated across cycles
#[derive(Debug, Clone, Default)]
pub struct RefreshMetrics {
    /// Cycles that completed
    pub cycle_count: usize,
    /// Cycles that failed
    pub failure_count: usize,
    /// Group updates across all cycles
    pub group_updates: usize,
    /// Cycles in which overrides changed the store
    pub override_changes: usize,
    /// Geolocation records added
    pub geo_added: usize,
    /// Snapshot writes
    pub persist_count: usize,
    /// Cycles served from the fetch cache
    pub cached_fetches: usize,
    /// The most recent successful report
    pub last_report: Option<RefreshReport>,
}

impl RefreshMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed cycle
    pub fn record_cycle(&mut self, report: &RefreshReport) {
        self.cycle_count += 1;
        self.group_updates += report.group_updates;
        self.geo_added += report.geo_added;
        if report.overrides_changed {
            self.override_changes += 1;
        }
        if report.persisted {
            self.persist_count += 1;
        }
        if report.cached_fetch {
            self.cached_fetches += 1;
        }
        self.last_report = Some(report.clone());
    }

    /// Record a failed cycle
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Refresh Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Cycles: {} ({} failed)", self.cycle_count, self.failure_count),
            format!("Group updates: {}", self.group_updates),
            format!("Override changes: {}", self.override_changes),
            format!("Geo records added: {}", self.geo_added),
            format!("Snapshot writes: {}", self.persist_count),
            format!("Cached fetches: {}", self.cached_fetches),
        ];
        if let Some(report) = &self.last_report {
            lines.push(String::new());
            lines.push(format!("Last cycle: {}", report.summary()));
        }
        lines.join("\n")
    }
}
