//! altgraph Resolver
//!
//! The rules that turn evidence into alt groups.
//!
//! - [`merge`]: fold an observation into the store, unioning every group it touches
//! - [`QuarantinePlan`]: pull a designated identity set out of a batch before merging
//! - [`apply_overrides`]: enforce administratively pinned groups, severing stale links
//! - [`prune_lone_entries`] / [`relocate_ip_identities`]: store housekeeping
//!
//! Every mutating function preserves the closure invariant described on
//! [`GroupRecord`](altgraph_domain::GroupRecord).
//!
//! # Examples
//!
//! ```
//! use altgraph_domain::{Evidence, ParsedTranscript};
//! use altgraph_resolver::merge_observation;
//! use altgraph_store::IdentityStore;
//! use chrono::Utc;
//!
//! let mut store = IdentityStore::in_memory();
//! let evidence = Evidence::Transcript(ParsedTranscript {
//!     main: "alice".into(),
//!     alts: vec!["bob".into()],
//!     ips: vec!["1.2.3.4".into()],
//!     timestamp: Utc::now(),
//! });
//!
//! let outcome = merge_observation(&mut store, &evidence.into_observation());
//! assert_eq!(outcome.created, 2);
//! assert_eq!(store.get("bob").unwrap().alts.len(), 2);
//! ```

#![warn(missing_docs)]

mod maintenance;
mod merge;
mod override_source;
mod overrides;
mod quarantine;

pub use maintenance::{prune_lone_entries, relocate_ip_identities, RelocationOutcome};
pub use merge::{merge, merge_batch, merge_observation, MergeOutcome};
pub use override_source::{parse_overrides, OverrideSource};
pub use overrides::apply_overrides;
pub use quarantine::{expand_fixpoint, QuarantinePlan};
