//! Evidence module - the two raw input shapes and their normalized form
//!
//! Evidence arrives either as a bot transcript ("<user> has N alts: ...") or
//! as one record of the remote feed (`identifier -> [members]`). Both are
//! normalized into an [`Observation`] before they reach the merge engine.

use crate::identity::{is_valid_ip, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

/// The remote feed shape: `identifier -> [co-occurring identities]`
pub type RawBatch = BTreeMap<String, Vec<String>>;

/// A transcript after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// The user the transcript is about
    pub main: String,

    /// Alt lines (defaults to `[main]` when the transcript lists none)
    pub alts: Vec<String>,

    /// IP lines that passed validation
    pub ips: Vec<String>,

    /// When the transcript was parsed
    pub timestamp: Timestamp,
}

/// One unit of evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// A parsed transcript
    Transcript(ParsedTranscript),

    /// One record of a feed batch
    BatchRecord {
        /// Feed key; contributes an IP when it is a valid address
        identifier: String,
        /// Identities observed with the identifier
        members: Vec<String>,
        /// Ingestion time
        timestamp: Timestamp,
    },
}

/// Normalized evidence: who was seen together, on which IPs, and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Identities observed together
    pub members: BTreeSet<String>,

    /// Valid IPs observed for those identities
    pub ips: BTreeSet<String>,

    /// Observation time
    pub timestamp: Timestamp,
}

impl Evidence {
    /// Split a feed batch into one evidence item per record
    pub fn from_batch(batch: &RawBatch, timestamp: Timestamp) -> Vec<Evidence> {
        batch
            .iter()
            .map(|(identifier, members)| Evidence::BatchRecord {
                identifier: identifier.clone(),
                members: members.clone(),
                timestamp,
            })
            .collect()
    }

    /// Normalize into an [`Observation`]
    ///
    /// Invalid IP strings never survive normalization.
    ///
    /// # Examples
    ///
    /// ```
    /// use altgraph_domain::Evidence;
    /// use chrono::Utc;
    ///
    /// let evidence = Evidence::BatchRecord {
    ///     identifier: "1.2.3.4".into(),
    ///     members: vec!["alice".into(), "bob".into()],
    ///     timestamp: Utc::now(),
    /// };
    /// let obs = evidence.into_observation();
    /// assert_eq!(obs.members.len(), 2);
    /// assert!(obs.ips.contains("1.2.3.4"));
    /// ```
    pub fn into_observation(self) -> Observation {
        match self {
            Evidence::Transcript(parsed) => {
                let mut members: BTreeSet<String> = parsed.alts.into_iter().collect();
                members.insert(parsed.main);
                Observation {
                    members,
                    ips: parsed.ips.into_iter().filter(|ip| is_valid_ip(ip)).collect(),
                    timestamp: parsed.timestamp,
                }
            }
            Evidence::BatchRecord {
                identifier,
                members,
                timestamp,
            } => {
                let ips = if is_valid_ip(&identifier) {
                    BTreeSet::from([identifier])
                } else {
                    BTreeSet::new()
                };
                Observation {
                    members: members.into_iter().collect(),
                    ips,
                    timestamp,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_transcript_includes_main() {
        let evidence = Evidence::Transcript(ParsedTranscript {
            main: "alice".into(),
            alts: vec!["bob".into()],
            ips: vec!["1.2.3.4".into()],
            timestamp: Utc::now(),
        });
        let obs = evidence.into_observation();
        assert!(obs.members.contains("alice"));
        assert!(obs.members.contains("bob"));
        assert_eq!(obs.ips.len(), 1);
    }

    #[test]
    fn test_transcript_drops_invalid_ips() {
        let evidence = Evidence::Transcript(ParsedTranscript {
            main: "alice".into(),
            alts: vec![],
            ips: vec!["cafe".into(), "10.0.0.1".into()],
            timestamp: Utc::now(),
        });
        let obs = evidence.into_observation();
        assert_eq!(obs.ips, BTreeSet::from(["10.0.0.1".to_string()]));
    }

    #[test]
    fn test_batch_record_non_ip_identifier_contributes_no_ip() {
        let evidence = Evidence::BatchRecord {
            identifier: "W".into(),
            members: vec!["Y".into()],
            timestamp: Utc::now(),
        };
        let obs = evidence.into_observation();
        assert!(obs.ips.is_empty());
        assert!(!obs.members.contains("W"));
    }

    #[test]
    fn test_from_batch_one_item_per_record() {
        let mut batch = RawBatch::new();
        batch.insert("1.1.1.1".into(), vec!["a".into()]);
        batch.insert("2.2.2.2".into(), vec!["b".into(), "c".into()]);
        let items = Evidence::from_batch(&batch, Utc::now());
        assert_eq!(items.len(), 2);
    }
}
