//! Snapshot file format
//!
//! ```json
//! {
//!   "alice": {
//!     "alts": ["alice", "bob"],
//!     "ips": ["1.2.3.4"],
//!     "first_seen": "2024-05-01T12:00:00Z",
//!     "last_updated": "2024-05-02T08:30:00Z"
//!   }
//! }
//! ```
//!
//! Sets are written sorted. Timestamps are RFC 3339; naive ISO-8601 values
//! (no offset) are read as UTC and an empty string means "unknown".

use crate::StoreError;
use altgraph_domain::{GroupRecord, Timestamp};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk representation of one [`GroupRecord`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SnapshotEntry {
    #[serde(default)]
    pub alts: Vec<String>,

    #[serde(default)]
    pub ips: Vec<String>,

    #[serde(default, with = "iso_timestamp")]
    pub first_seen: Option<Timestamp>,

    #[serde(default, with = "iso_timestamp")]
    pub last_updated: Option<Timestamp>,
}

impl From<&GroupRecord> for SnapshotEntry {
    fn from(record: &GroupRecord) -> Self {
        // BTreeSet iteration is already sorted
        Self {
            alts: record.alts.iter().cloned().collect(),
            ips: record.ips.iter().cloned().collect(),
            first_seen: record.first_seen,
            last_updated: record.last_updated,
        }
    }
}

impl From<SnapshotEntry> for GroupRecord {
    fn from(entry: SnapshotEntry) -> Self {
        GroupRecord::new(
            entry.alts.into_iter().collect(),
            entry.ips.into_iter().collect(),
            entry.first_seen,
            entry.last_updated,
        )
    }
}

/// Parse a snapshot timestamp
///
/// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC).
/// The empty string is "unknown".
pub fn parse_timestamp(raw: &str) -> Result<Option<Timestamp>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| format!("invalid timestamp '{}': {}", trimmed, e))
}

/// Render a timestamp the way snapshots store it
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

mod iso_timestamp {
    use super::{format_timestamp, parse_timestamp};
    use altgraph_domain::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_str(&format_timestamp(ts)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(raw) => parse_timestamp(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Read a snapshot file into records
///
/// A missing file is an empty store. A file in the raw feed shape
/// (`identifier -> [members]`) is rejected with [`StoreError::NotASnapshot`].
pub(crate) fn read_snapshot(path: &Path) -> Result<BTreeMap<String, GroupRecord>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let value: serde_json::Value = serde_json::from_str(&contents)?;
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::InvalidData("snapshot root must be a JSON object".to_string()))?;
    if object.values().any(|v| v.is_array()) {
        return Err(StoreError::NotASnapshot(path.display().to_string()));
    }

    let entries: BTreeMap<String, SnapshotEntry> = serde_json::from_value(value)?;
    Ok(entries
        .into_iter()
        .map(|(key, entry)| (key, GroupRecord::from(entry)))
        .collect())
}

/// Write records to `path` atomically (temp file, then rename)
pub(crate) fn write_snapshot(
    path: &Path,
    records: &BTreeMap<String, GroupRecord>,
) -> Result<(), StoreError> {
    let entries: BTreeMap<&str, SnapshotEntry> = records
        .iter()
        .map(|(key, record)| (key.as_str(), SnapshotEntry::from(record)))
        .collect();
    let json = serde_json::to_string_pretty(&entries)?;
    write_atomically(path, &json)
}

/// Write `contents` to a sibling temp file and rename it over `path`
pub(crate) fn write_atomically(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
