//! altgraph Storage Layer
//!
//! Durable mapping `identity -> GroupRecord` backed by a JSON snapshot file,
//! plus the geolocation cache that sits next to it.
//!
//! # Architecture
//!
//! - In-memory `BTreeMap` owned by an explicit [`IdentityStore`] value
//! - Snapshot path injected at construction; no global state
//! - Atomic snapshot writes (temp file + rename)
//!
//! # Examples
//!
//! ```no_run
//! use altgraph_store::IdentityStore;
//!
//! let store = IdentityStore::open("data/alts_data.json").unwrap();
//! println!("{} identities", store.len());
//! ```

#![warn(missing_docs)]

mod geo_cache;
mod snapshot;

pub use geo_cache::GeoCache;
pub use snapshot::{format_timestamp, parse_timestamp};

use altgraph_domain::GroupRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The file holds a raw feed batch, not a snapshot
    #[error("{0} looks like a raw feed batch, not a snapshot; import it instead")]
    NotASnapshot(String),

    /// Save requested on a store with no snapshot path
    #[error("Store has no snapshot path")]
    NoPath,
}

/// Summary counts over a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of identity keys
    pub identities: usize,
    /// Number of distinct groups
    pub groups: usize,
    /// Number of distinct IPs across all groups
    pub distinct_ips: usize,
    /// Size of the largest group's `alts`
    pub largest_group: usize,
}

/// The identity store
///
/// Cloning is cheap enough for copy-on-write refresh cycles: the refresh
/// coordinator mutates a clone and swaps it in once the cycle succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityStore {
    path: Option<PathBuf>,
    records: BTreeMap<String, GroupRecord>,
}

impl IdentityStore {
    /// Create an empty store that is never persisted
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`, loading the snapshot if it exists
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed snapshot files. A missing file is an
    /// empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = snapshot::read_snapshot(&path)?;
        tracing::info!("Loaded {} structured alt records from {}", records.len(), path.display());
        Ok(Self {
            path: Some(path),
            records,
        })
    }

    /// Build a store from records, persisted at `path` if given
    pub fn from_records(path: Option<PathBuf>, records: BTreeMap<String, GroupRecord>) -> Self {
        Self { path, records }
    }

    /// Snapshot path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot to the store's path
    pub fn save(&self) -> Result<(), StoreError> {
        let path = self.path.as_deref().ok_or(StoreError::NoPath)?;
        self.save_to(path)
    }

    /// Write the snapshot to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        snapshot::write_snapshot(path, &self.records)?;
        tracing::debug!("Saved {} records to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Record stored under `identity`
    pub fn get(&self, identity: &str) -> Option<&GroupRecord> {
        self.records.get(identity)
    }

    /// Mutable record stored under `identity`
    pub fn get_mut(&mut self, identity: &str) -> Option<&mut GroupRecord> {
        self.records.get_mut(identity)
    }

    /// Whether `identity` has a record
    pub fn contains(&self, identity: &str) -> bool {
        self.records.contains_key(identity)
    }

    /// Insert or overwrite a record, returning the previous one
    pub fn insert(&mut self, identity: impl Into<String>, record: GroupRecord) -> Option<GroupRecord> {
        self.records.insert(identity.into(), record)
    }

    /// Delete a record
    pub fn remove(&mut self, identity: &str) -> Option<GroupRecord> {
        self.records.remove(identity)
    }

    /// Number of identity keys
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(identity, record)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GroupRecord)> {
        self.records.iter()
    }

    /// Iterate mutably over `(identity, record)` in key order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut GroupRecord)> {
        self.records.iter_mut()
    }

    /// All identity keys in order
    pub fn identities(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    /// Borrow the underlying map
    pub fn records(&self) -> &BTreeMap<String, GroupRecord> {
        &self.records
    }

    /// Find an identity: exact key first, then case-insensitive
    ///
    /// Returns the stored key spelling together with its record.
    pub fn find(&self, name: &str) -> Option<(&String, &GroupRecord)> {
        if let Some(found) = self.records.get_key_value(name) {
            return Some(found);
        }
        let lowered = name.to_lowercase();
        self.records
            .iter()
            .find(|(key, _)| key.to_lowercase() == lowered)
    }

    /// Every IP carried by any record
    pub fn all_ips(&self) -> BTreeSet<String> {
        self.records
            .values()
            .flat_map(|record| record.ips.iter().cloned())
            .collect()
    }

    /// Pairs `(x, y)` where `y ∈ store[x].alts` but the two records disagree
    ///
    /// Members named in `alts` without a record of their own are reported too.
    /// An empty result means the closure invariant holds.
    pub fn closure_violations(&self) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        for (key, record) in &self.records {
            for alt in &record.alts {
                match self.records.get(alt) {
                    Some(other) if other.same_group(record) => {}
                    _ => violations.push((key.clone(), alt.clone())),
                }
            }
        }
        violations
    }

    /// Summary counts
    pub fn stats(&self) -> StoreStats {
        let groups: BTreeSet<&BTreeSet<String>> =
            self.records.values().map(|record| &record.alts).collect();
        StoreStats {
            identities: self.records.len(),
            groups: groups.len(),
            distinct_ips: self.all_ips().len(),
            largest_group: self
                .records
                .values()
                .map(|record| record.alts.len())
                .max()
                .unwrap_or(0),
        }
    }
}
