//! Override rules - administratively pinned groups

use crate::identity::is_valid_ip;
use std::collections::BTreeSet;

/// A pinned grouping that takes precedence over ambient evidence
///
/// When `ips_pinned` is false the group's IPs are inherited from whatever
/// the pinned members currently carry, computed when the rule is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    /// The identity the rule is keyed on
    pub main: String,

    /// Identities pinned into the group alongside `main`
    pub pinned_alts: BTreeSet<String>,

    /// IPs pinned to the group (only meaningful when `ips_pinned`)
    pub pinned_ips: BTreeSet<String>,

    /// Whether `pinned_ips` replaces inherited IPs
    pub ips_pinned: bool,
}

impl OverrideRule {
    /// A rule that pins `alts` to `main` and inherits IPs
    ///
    /// # Examples
    ///
    /// ```
    /// use altgraph_domain::OverrideRule;
    ///
    /// let rule = OverrideRule::new("eve", ["mallory"]);
    /// assert!(!rule.ips_pinned);
    /// assert!(rule.final_alts().contains("eve"));
    /// ```
    pub fn new<I, S>(main: impl Into<String>, alts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            main: main.into(),
            pinned_alts: alts.into_iter().map(Into::into).collect(),
            pinned_ips: BTreeSet::new(),
            ips_pinned: false,
        }
    }

    /// Pin the group's IPs; invalid addresses are dropped
    pub fn with_pinned_ips<I, S>(mut self, ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pinned_ips = ips
            .into_iter()
            .map(Into::into)
            .filter(|ip: &String| is_valid_ip(ip))
            .collect();
        self.ips_pinned = true;
        self
    }

    /// `pinned_alts ∪ {main}`
    pub fn final_alts(&self) -> BTreeSet<String> {
        let mut alts = self.pinned_alts.clone();
        alts.insert(self.main.clone());
        alts
    }
}
