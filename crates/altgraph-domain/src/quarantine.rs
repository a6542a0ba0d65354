//! Quarantine seed - identities isolated from ordinary merging

use crate::evidence::RawBatch;
use crate::identity::is_valid_ip;
use std::collections::BTreeSet;

/// The fixed starting point of a quarantine policy
///
/// The effective seed set `Q0` for a batch is `identities` plus every member
/// of the batch that starts with one of `prefixes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuarantineSeed {
    /// Identities known to require isolation
    pub identities: BTreeSet<String>,

    /// Member prefixes that mark an identity as quarantined
    pub prefixes: Vec<String>,

    /// The only IPs the quarantined group is allowed to carry
    pub trusted_ips: BTreeSet<String>,
}

impl QuarantineSeed {
    /// Build a seed from identities and trusted IPs (invalid IPs are dropped)
    pub fn new<I, S, J, T>(identities: I, trusted_ips: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            identities: identities.into_iter().map(Into::into).collect(),
            prefixes: Vec::new(),
            trusted_ips: trusted_ips
                .into_iter()
                .map(Into::into)
                .filter(|ip: &String| is_valid_ip(ip))
                .collect(),
        }
    }

    /// Add member prefixes that pull identities into the seed
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        self
    }

    /// Whether `identity` matches one of the seed prefixes
    pub fn matches_prefix(&self, identity: &str) -> bool {
        self.prefixes.iter().any(|p| identity.starts_with(p.as_str()))
    }

    /// The effective seed set `Q0` for `batch`
    ///
    /// # Examples
    ///
    /// ```
    /// use altgraph_domain::{QuarantineSeed, RawBatch};
    ///
    /// let seed = QuarantineSeed::new(["X"], Vec::<String>::new()).with_prefixes(["..."]);
    /// let mut batch = RawBatch::new();
    /// batch.insert("1.1.1.1".into(), vec!["...ghost".into(), "alice".into()]);
    ///
    /// let q0 = seed.initial_set(&batch);
    /// assert!(q0.contains("X"));
    /// assert!(q0.contains("...ghost"));
    /// assert!(!q0.contains("alice"));
    /// ```
    pub fn initial_set(&self, batch: &RawBatch) -> BTreeSet<String> {
        let mut set = self.identities.clone();
        if !self.prefixes.is_empty() {
            set.extend(
                batch
                    .values()
                    .flatten()
                    .filter(|member| self.matches_prefix(member))
                    .cloned(),
            );
        }
        set
    }
}
