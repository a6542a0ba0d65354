//! Group module - the denormalized alt-group record
//!
//! Every member of a group stores an identical copy of the group. That
//! redundancy is what lets the merge engine fold in a whole group by looking
//! at a single member (see the closure invariant on [`GroupRecord`]).

use crate::identity::Timestamp;
use std::collections::BTreeSet;

/// The group stored under one identity key
///
/// # Closure invariant
///
/// For any two identities `x` and `y` in a store, if `y` is in
/// `store[x].alts` then `store[y].alts == store[x].alts` and
/// `store[y].ips == store[x].ips`.
///
/// Sets are ordered so that serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupRecord {
    /// Every identity in the group, including the key itself
    pub alts: BTreeSet<String>,

    /// Every IP address observed for the group
    pub ips: BTreeSet<String>,

    /// When any member of the group was first observed (`None` if unknown)
    pub first_seen: Option<Timestamp>,

    /// When the record was last written (`None` if unknown)
    pub last_updated: Option<Timestamp>,
}

impl GroupRecord {
    /// Create a record from its parts
    pub fn new(
        alts: BTreeSet<String>,
        ips: BTreeSet<String>,
        first_seen: Option<Timestamp>,
        last_updated: Option<Timestamp>,
    ) -> Self {
        Self {
            alts,
            ips,
            first_seen,
            last_updated,
        }
    }

    /// A group containing only `identity`, first seen at `timestamp`
    ///
    /// # Examples
    ///
    /// ```
    /// use altgraph_domain::GroupRecord;
    /// use chrono::Utc;
    ///
    /// let record = GroupRecord::singleton("alice", Utc::now());
    /// assert!(record.alts.contains("alice"));
    /// assert!(record.ips.is_empty());
    /// ```
    pub fn singleton(identity: &str, timestamp: Timestamp) -> Self {
        Self {
            alts: BTreeSet::from([identity.to_string()]),
            ips: BTreeSet::new(),
            first_seen: Some(timestamp),
            last_updated: Some(timestamp),
        }
    }

    /// True when both records describe the same membership and IP set
    ///
    /// Timestamps are ignored; this is the comparison the closure invariant uses.
    pub fn same_group(&self, other: &GroupRecord) -> bool {
        self.alts == other.alts && self.ips == other.ips
    }

    /// True when the record is the key alone with no IPs
    pub fn is_lone(&self, key: &str) -> bool {
        self.ips.is_empty() && self.alts.iter().all(|alt| alt == key)
    }
}
