//! Override engine - enforce pinned groups
//!
//! Applying a rule has two passes. Severance strips the pinned members and
//! IPs out of every other record. The write pass then overwrites each
//! pinned member with the pinned group. Records that would not change are
//! left alone, which keeps repeated application a no-op.

use altgraph_domain::{is_valid_ip, GroupRecord, OverrideRule, Timestamp};
use altgraph_store::IdentityStore;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// How the write pass treats records that already hold the target group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Skip records whose alts, IPs and `first_seen` already match
    IfChanged,
    /// Always rewrite, refreshing `last_updated`
    Always,
}

/// Apply every rule in order; returns whether any record changed
///
/// # Examples
///
/// ```
/// use altgraph_domain::OverrideRule;
/// use altgraph_resolver::apply_overrides;
/// use altgraph_store::IdentityStore;
/// use chrono::Utc;
///
/// let mut store = IdentityStore::in_memory();
/// let rules = vec![OverrideRule::new("eve", ["mallory"])];
///
/// assert!(apply_overrides(&mut store, &rules, Utc::now()));
/// assert!(!apply_overrides(&mut store, &rules, Utc::now()));
/// assert_eq!(store.get("mallory").unwrap().alts.len(), 2);
/// ```
pub fn apply_overrides(store: &mut IdentityStore, rules: &[OverrideRule], timestamp: Timestamp) -> bool {
    let mut changed = false;
    for rule in rules {
        if apply_rule(store, rule, timestamp) {
            info!("Override for '{}' changed the store", rule.main);
            changed = true;
        }
    }
    changed
}

fn apply_rule(store: &mut IdentityStore, rule: &OverrideRule, timestamp: Timestamp) -> bool {
    let final_alts = rule.final_alts();
    let final_ips: BTreeSet<String> = if rule.ips_pinned {
        rule.pinned_ips.iter().filter(|ip| is_valid_ip(ip)).cloned().collect()
    } else {
        final_alts
            .iter()
            .filter_map(|alt| store.get(alt))
            .flat_map(|record| record.ips.iter())
            .filter(|ip| is_valid_ip(ip))
            .cloned()
            .collect()
    };
    let first_seen = earliest_first_seen(store, &final_alts).unwrap_or(timestamp);

    pin_group(
        store,
        &final_alts,
        &final_ips,
        &final_ips,
        first_seen,
        timestamp,
        WriteMode::IfChanged,
    )
}

/// Minimum known `first_seen` among `identities`
pub(crate) fn earliest_first_seen(
    store: &IdentityStore,
    identities: &BTreeSet<String>,
) -> Option<Timestamp> {
    identities
        .iter()
        .filter_map(|id| store.get(id).and_then(|record| record.first_seen))
        .min()
}

/// Make `alts` an isolated group carrying exactly `ips`
///
/// Records outside the group lose their links into it and any IP in
/// `stripped_ips`; their other IPs are kept.
pub(crate) fn pin_group(
    store: &mut IdentityStore,
    alts: &BTreeSet<String>,
    ips: &BTreeSet<String>,
    stripped_ips: &BTreeSet<String>,
    first_seen: Timestamp,
    timestamp: Timestamp,
    mode: WriteMode,
) -> bool {
    let severed = sever(store, alts, stripped_ips, timestamp);

    let target = GroupRecord::new(alts.clone(), ips.clone(), Some(first_seen), Some(timestamp));
    let mut written = 0usize;
    for identity in alts {
        let unchanged = match (store.get(identity), mode) {
            (Some(existing), WriteMode::IfChanged) => {
                existing.same_group(&target) && existing.first_seen == target.first_seen
            }
            (Some(existing), WriteMode::Always) => *existing == target,
            (None, _) => false,
        };
        if unchanged {
            continue;
        }
        store.insert(identity.clone(), target.clone());
        written += 1;
    }

    if severed > 0 || written > 0 {
        debug!(
            "Pinned group of {} identities: severed {}, wrote {}",
            alts.len(),
            severed,
            written
        );
    }
    severed > 0 || written > 0
}

/// Remove `alts` and `ips` from every record outside the pinned group
fn sever(
    store: &mut IdentityStore,
    alts: &BTreeSet<String>,
    ips: &BTreeSet<String>,
    timestamp: Timestamp,
) -> usize {
    let mut severed = 0;
    for (identity, record) in store.iter_mut() {
        if alts.contains(identity) {
            continue;
        }
        let linked = record.alts.iter().any(|alt| alts.contains(alt));
        let shares_ip = record.ips.iter().any(|ip| ips.contains(ip));
        if !linked && !shares_ip {
            continue;
        }

        record.alts.retain(|alt| !alts.contains(alt));
        record.alts.insert(identity.clone());
        record.ips.retain(|ip| !ips.contains(ip));
        if record.first_seen.is_none() {
            record.first_seen = Some(timestamp);
        }
        record.last_updated = Some(timestamp);
        severed += 1;
    }
    severed
}
