//! Store housekeeping

use altgraph_domain::{is_valid_ip, Timestamp};
use altgraph_store::IdentityStore;
use std::collections::BTreeSet;
use tracing::info;

/// Delete identities whose group is only themselves and that carry no IPs
///
/// Returns the number of records removed.
pub fn prune_lone_entries(store: &mut IdentityStore) -> usize {
    let lone: Vec<String> = store
        .iter()
        .filter(|(identity, record)| record.is_lone(identity))
        .map(|(identity, _)| identity.clone())
        .collect();
    for identity in &lone {
        store.remove(identity);
    }
    if !lone.is_empty() {
        info!("Pruned {} lone entries", lone.len());
    }
    lone.len()
}

/// What [`relocate_ip_identities`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocationOutcome {
    /// Groups that contained IP-shaped identities
    pub groups: usize,
    /// IP-shaped identities moved from `alts` to `ips`
    pub ips_moved: usize,
    /// IP-keyed records deleted
    pub records_removed: usize,
}

/// Move identities that are really IP addresses into their group's `ips`
///
/// Each group is rewritten uniformly, and records keyed by an IP are removed.
pub fn relocate_ip_identities(store: &mut IdentityStore, timestamp: Timestamp) -> RelocationOutcome {
    let mut outcome = RelocationOutcome::default();
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let keys: Vec<String> = store.identities().cloned().collect();

    for key in keys {
        if visited.contains(&key) {
            continue;
        }
        let Some(group) = store.get(&key).map(|record| record.alts.clone()) else {
            continue;
        };
        visited.extend(group.iter().cloned());
        visited.insert(key.clone());

        let ip_members: BTreeSet<String> = group.iter().filter(|m| is_valid_ip(m)).cloned().collect();
        if ip_members.is_empty() {
            continue;
        }
        outcome.groups += 1;
        outcome.ips_moved += ip_members.len();

        for member in group.iter().filter(|m| !ip_members.contains(*m)) {
            if let Some(record) = store.get_mut(member) {
                record.alts.retain(|alt| !ip_members.contains(alt));
                record.ips.extend(ip_members.iter().cloned());
                record.last_updated = Some(timestamp);
            }
        }
    }

    let ip_keys: Vec<String> = store.identities().filter(|id| is_valid_ip(id)).cloned().collect();
    for key in ip_keys {
        store.remove(&key);
        outcome.records_removed += 1;
    }

    if outcome.ips_moved > 0 || outcome.records_removed > 0 {
        info!(
            "Moved {} IP identities across {} groups, removed {} IP-keyed records",
            outcome.ips_moved, outcome.groups, outcome.records_removed
        );
    }
    outcome
}
