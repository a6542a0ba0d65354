//! Load override rules from a JSON file
//!
//! ```json
//! {
//!   "eve": { "alts": ["mallory"] },
//!   "trent": { "alts": ["victor"], "ips": ["203.0.113.7"] }
//! }
//! ```
//!
//! Loading never fails. Bad input degrades to fewer (or zero) rules with a
//! warning, so a broken override file cannot stall a refresh cycle.

use altgraph_domain::OverrideRule;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file of override rules, re-read on every load
#[derive(Debug, Clone)]
pub struct OverrideSource {
    path: PathBuf,
}

impl OverrideSource {
    /// Point at an override file (it need not exist yet)
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The file this source reads
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current rules
    ///
    /// A missing file yields no rules; unreadable or malformed content is
    /// logged and yields no rules.
    pub fn load(&self) -> Vec<OverrideRule> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_overrides(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No override file at {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Could not read override file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Parse override rules from JSON text
///
/// The presence of an `ips` key pins the group's IPs, even when the list is empty.
///
/// # Examples
///
/// ```
/// use altgraph_resolver::parse_overrides;
///
/// let rules = parse_overrides(r#"{"eve": {"alts": ["mallory"], "ips": []}}"#);
/// assert_eq!(rules.len(), 1);
/// assert!(rules[0].ips_pinned);
///
/// assert!(parse_overrides("[1, 2, 3]").is_empty());
/// ```
pub fn parse_overrides(json: &str) -> Vec<OverrideRule> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            warn!("Override file is not valid JSON: {}", e);
            return Vec::new();
        }
    };
    let Value::Object(entries) = value else {
        warn!("Invalid override format: expected a JSON object at root");
        return Vec::new();
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (main, entry) in entries {
        let Value::Object(entry) = entry else {
            warn!("Skipping override '{}': entry is not an object", main);
            continue;
        };
        let alts = string_list(&entry, "alts", &main);
        let mut rule = OverrideRule::new(main.clone(), alts);
        if entry.contains_key("ips") {
            rule = rule.with_pinned_ips(string_list(&entry, "ips", &main));
        }
        rules.push(rule);
    }
    debug!("Loaded {} override rules", rules.len());
    rules
}

fn string_list(entry: &Map<String, Value>, key: &str, main: &str) -> Vec<String> {
    match entry.get(key) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    warn!("Override '{}': ignoring non-string {} entry {}", main, key, other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!("Override '{}': '{}' should be a list, got {}", main, key, other);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_entry() {
        let rules = parse_overrides(
            r#"{
                "trent": {"alts": ["victor", "walter"], "ips": ["203.0.113.7", "bogus"]}
            }"#,
        );
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.main, "trent");
        assert_eq!(rule.pinned_alts.len(), 2);
        assert!(rule.ips_pinned);
        assert_eq!(rule.pinned_ips, BTreeSet::from(["203.0.113.7".to_string()]));
    }

    #[test]
    fn test_missing_ips_inherits() {
        let rules = parse_overrides(r#"{"eve": {"alts": ["mallory"]}}"#);
        assert!(!rules[0].ips_pinned);
    }

    #[test]
    fn test_bad_entries_skipped() {
        let rules = parse_overrides(r#"{"a": "oops", "b": {"alts": "nope"}, "c": {"alts": ["d", 5]}}"#);
        assert_eq!(rules.len(), 2);
        let b = rules.iter().find(|r| r.main == "b").unwrap();
        assert!(b.pinned_alts.is_empty());
        let c = rules.iter().find(|r| r.main == "c").unwrap();
        assert_eq!(c.pinned_alts.len(), 1);
    }

    #[test]
    fn test_garbage_yields_nothing() {
        assert!(parse_overrides("{{{").is_empty());
        assert!(parse_overrides("\"text\"").is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overrides.json");
        let source = OverrideSource::new(&path);
        assert!(source.load().is_empty());

        std::fs::write(&path, r#"{"eve": {"alts": ["mallory"]}}"#).unwrap();
        assert_eq!(source.load().len(), 1);

        std::fs::write(&path, "not json").unwrap();
        assert!(source.load().is_empty());
    }
}
