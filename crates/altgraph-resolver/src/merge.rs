//! Merge engine - union observations into the store
//!
//! Because every existing member already stores its complete group, one
//! lookup per observed member is enough to find every group the
//! observation touches. All of them collapse into a single group.

use altgraph_domain::{is_valid_ip, Evidence, GroupRecord, Observation, RawBatch, Timestamp};
use altgraph_store::IdentityStore;
use std::collections::BTreeSet;
use std::ops::AddAssign;
use tracing::debug;

/// Counts describing what a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Observations that reached the store (empty ones are skipped)
    pub observations: usize,
    /// Identities that had no record before
    pub created: usize,
    /// Existing identities whose alts or IPs grew
    pub updated: usize,
}

impl MergeOutcome {
    /// Whether any observation was written
    pub fn merged_any(&self) -> bool {
        self.observations > 0
    }
}

impl AddAssign for MergeOutcome {
    fn add_assign(&mut self, other: Self) {
        self.observations += other.observations;
        self.created += other.created;
        self.updated += other.updated;
    }
}

/// Merge `members` and `ips` observed together at `timestamp`
///
/// Invalid IP strings are dropped. An empty member set is a no-op.
/// New identities get `first_seen = timestamp`; existing ones keep theirs.
/// Every member of the resulting group gets `last_updated = timestamp`.
pub fn merge(
    store: &mut IdentityStore,
    members: &BTreeSet<String>,
    ips: &BTreeSet<String>,
    timestamp: Timestamp,
) -> MergeOutcome {
    if members.is_empty() {
        return MergeOutcome::default();
    }

    let mut union_members = members.clone();
    let mut union_ips: BTreeSet<String> = ips.iter().filter(|ip| is_valid_ip(ip)).cloned().collect();
    for member in members {
        if let Some(existing) = store.get(member) {
            union_members.extend(existing.alts.iter().cloned());
            union_ips.extend(existing.ips.iter().cloned());
        }
    }

    let mut outcome = MergeOutcome {
        observations: 1,
        ..MergeOutcome::default()
    };
    for identity in &union_members {
        let first_seen = match store.get(identity) {
            Some(existing) => {
                if existing.alts != union_members || existing.ips != union_ips {
                    outcome.updated += 1;
                }
                existing.first_seen
            }
            None => {
                outcome.created += 1;
                Some(timestamp)
            }
        };
        store.insert(
            identity.clone(),
            GroupRecord::new(
                union_members.clone(),
                union_ips.clone(),
                first_seen,
                Some(timestamp),
            ),
        );
    }

    debug!(
        "Merged group of {} identities and {} IPs ({} new, {} grown)",
        union_members.len(),
        union_ips.len(),
        outcome.created,
        outcome.updated
    );
    outcome
}

/// Merge a normalized observation
pub fn merge_observation(store: &mut IdentityStore, observation: &Observation) -> MergeOutcome {
    merge(
        store,
        &observation.members,
        &observation.ips,
        observation.timestamp,
    )
}

/// Merge every record of a feed batch, in key order
pub fn merge_batch(store: &mut IdentityStore, batch: &RawBatch, timestamp: Timestamp) -> MergeOutcome {
    let mut total = MergeOutcome::default();
    for evidence in Evidence::from_batch(batch, timestamp) {
        total += merge_observation(store, &evidence.into_observation());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_into_empty_store() {
        let ts = Utc::now();
        let mut store = IdentityStore::in_memory();
        let outcome = merge(&mut store, &set(&["alice", "bob"]), &set(&["1.2.3.4"]), ts);

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 0);
        let alice = store.get("alice").unwrap();
        assert_eq!(alice.alts, set(&["alice", "bob"]));
        assert_eq!(alice.ips, set(&["1.2.3.4"]));
        assert_eq!(alice.first_seen, Some(ts));
        assert_eq!(store.get("bob"), Some(alice));
    }

    #[test]
    fn test_merge_empty_members_is_noop() {
        let mut store = IdentityStore::in_memory();
        let outcome = merge(&mut store, &BTreeSet::new(), &set(&["1.2.3.4"]), Utc::now());
        assert_eq!(outcome, MergeOutcome::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_drops_invalid_ips() {
        let mut store = IdentityStore::in_memory();
        merge(&mut store, &set(&["alice"]), &set(&["1.2.3.4", "nope", "300.1.1.1"]), Utc::now());
        assert_eq!(store.get("alice").unwrap().ips, set(&["1.2.3.4"]));
    }

    #[test]
    fn test_merge_keeps_first_seen() {
        let early = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = IdentityStore::in_memory();
        merge(&mut store, &set(&["alice"]), &BTreeSet::new(), early);
        let outcome = merge(&mut store, &set(&["alice", "bob"]), &BTreeSet::new(), late);

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(store.get("alice").unwrap().first_seen, Some(early));
        assert_eq!(store.get("bob").unwrap().first_seen, Some(late));
        assert_eq!(store.get("alice").unwrap().last_updated, Some(late));
    }

    #[test]
    fn test_merge_bridges_two_groups() {
        let ts = Utc::now();
        let mut store = IdentityStore::in_memory();
        merge(&mut store, &set(&["a1", "a2"]), &set(&["1.1.1.1"]), ts);
        merge(&mut store, &set(&["b1", "b2"]), &set(&["2.2.2.2"]), ts);
        merge(&mut store, &set(&["a1", "b1"]), &BTreeSet::new(), ts);

        let expected = set(&["a1", "a2", "b1", "b2"]);
        for id in &expected {
            let record = store.get(id).unwrap();
            assert_eq!(record.alts, expected);
            assert_eq!(record.ips, set(&["1.1.1.1", "2.2.2.2"]));
        }
        assert!(store.closure_violations().is_empty());
    }

    #[test]
    fn test_repeat_merge_updates_nothing() {
        let ts = Utc::now();
        let mut store = IdentityStore::in_memory();
        merge(&mut store, &set(&["alice", "bob"]), &set(&["1.2.3.4"]), ts);
        let outcome = merge(&mut store, &set(&["bob"]), &BTreeSet::new(), ts);
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.observations, 1);
    }

    #[test]
    fn test_merge_batch() {
        let ts = Utc::now();
        let mut batch = RawBatch::new();
        batch.insert("1.2.3.4".into(), vec!["alice".into(), "bob".into()]);
        batch.insert("5.6.7.8".into(), vec!["bob".into(), "carol".into()]);
        batch.insert("hwid".into(), vec![]);

        let mut store = IdentityStore::in_memory();
        let outcome = merge_batch(&mut store, &batch, ts);

        assert_eq!(outcome.observations, 2);
        let carol = store.get("carol").unwrap();
        assert_eq!(carol.alts, set(&["alice", "bob", "carol"]));
        assert_eq!(carol.ips, set(&["1.2.3.4", "5.6.7.8"]));
        assert!(!store.contains("hwid"));
    }
}
