//! Quarantine filter - isolate a seeded identity set from ordinary merging
//!
//! A batch is split in two. Records keyed by a quarantined identifier feed
//! an isolated pool; every other record has quarantined identities removed
//! and is merged normally. Once merging is done the quarantine group is
//! written over whatever the merge produced for its members.

use crate::overrides::{earliest_first_seen, pin_group, WriteMode};
use altgraph_domain::{is_valid_ip, QuarantineSeed, RawBatch, Timestamp};
use altgraph_store::IdentityStore;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Expand `seed` to a fixpoint over `batch`
///
/// An identifier is absorbed when every member of its record is already
/// quarantined. Records with no members are never absorbed.
///
/// # Examples
///
/// ```
/// use altgraph_domain::RawBatch;
/// use altgraph_resolver::expand_fixpoint;
/// use std::collections::BTreeSet;
///
/// let mut batch = RawBatch::new();
/// batch.insert("1.1.1.1".into(), vec!["X".into()]);
/// batch.insert("2.2.2.2".into(), vec!["X".into(), "1.1.1.1".into()]);
/// batch.insert("3.3.3.3".into(), vec!["X".into(), "alice".into()]);
///
/// let q = expand_fixpoint(&BTreeSet::from(["X".to_string()]), &batch);
/// assert!(q.contains("1.1.1.1"));
/// assert!(q.contains("2.2.2.2"));
/// assert!(!q.contains("3.3.3.3"));
/// ```
pub fn expand_fixpoint(seed: &BTreeSet<String>, batch: &RawBatch) -> BTreeSet<String> {
    let mut quarantined = seed.clone();
    loop {
        let absorbed: Vec<String> = batch
            .iter()
            .filter(|(identifier, members)| {
                !quarantined.contains(*identifier)
                    && !members.is_empty()
                    && members.iter().all(|m| quarantined.contains(m))
            })
            .map(|(identifier, _)| identifier.clone())
            .collect();
        if absorbed.is_empty() {
            return quarantined;
        }
        quarantined.extend(absorbed);
    }
}

/// The result of partitioning one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinePlan {
    /// The effective seed set `Q0`
    pub seed_set: BTreeSet<String>,
    /// `Q0` expanded to its fixpoint
    pub quarantined: BTreeSet<String>,
    /// Members of records keyed by a quarantined identifier
    pub isolated_pool: BTreeSet<String>,
    /// The remaining records with quarantined identities stripped
    pub filtered_batch: RawBatch,
    /// The IPs the quarantine group is allowed to carry
    pub allowlist: BTreeSet<String>,
}

impl QuarantinePlan {
    /// Partition `batch` according to `seed`
    pub fn build(batch: &RawBatch, seed: &QuarantineSeed) -> Self {
        let seed_set = seed.initial_set(batch);
        let quarantined = expand_fixpoint(&seed_set, batch);

        let mut isolated_pool = BTreeSet::new();
        let mut filtered_batch = RawBatch::new();
        let mut allowlist = seed.trusted_ips.clone();

        for (identifier, members) in batch {
            if quarantined.contains(identifier) {
                isolated_pool.extend(members.iter().cloned());
                if is_valid_ip(identifier) {
                    allowlist.insert(identifier.clone());
                }
                continue;
            }
            let kept: Vec<String> = members
                .iter()
                .filter(|m| !quarantined.contains(*m))
                .cloned()
                .collect();
            if !kept.is_empty() {
                filtered_batch.insert(identifier.clone(), kept);
            }
        }

        debug!(
            "Quarantine plan: {} seeded, {} quarantined, {} of {} records pass through",
            seed_set.len(),
            quarantined.len(),
            filtered_batch.len(),
            batch.len()
        );

        Self {
            seed_set,
            quarantined,
            isolated_pool,
            filtered_batch,
            allowlist,
        }
    }

    /// `isolated_pool ∪ Q0`
    pub fn final_group(&self) -> BTreeSet<String> {
        self.isolated_pool.union(&self.seed_set).cloned().collect()
    }

    /// Force-write the quarantine group; run after the filtered batch is merged
    ///
    /// Every member is overwritten with the group and the allowlisted IPs.
    /// Links from outside records into the group are severed so the
    /// closure invariant still holds afterwards. Outside records keep
    /// their IPs, including allowlisted ones.
    pub fn apply_isolation(&self, store: &mut IdentityStore, timestamp: Timestamp) -> bool {
        let group = self.final_group();
        if group.is_empty() {
            return false;
        }
        let first_seen = earliest_first_seen(store, &group).unwrap_or(timestamp);
        let changed = pin_group(
            store,
            &group,
            &self.allowlist,
            &BTreeSet::new(),
            first_seen,
            timestamp,
            WriteMode::Always,
        );
        info!(
            "Isolated quarantine group of {} identities with {} trusted IPs",
            group.len(),
            self.allowlist.len()
        );
        changed
    }
}
