//! altgraph Domain Layer
//!
//! This crate contains the core domain model for altgraph. It depends only on
//! `chrono` and defines the value objects and trait interfaces that every other
//! crate builds on.
//!
//! ## Key Concepts
//!
//! - **Identity**: A username or textual IP address, exact-string keyed
//! - **Alt group**: The set of identities believed to belong to one actor
//! - **GroupRecord**: The denormalized group stored under every member
//! - **OverrideRule**: An administratively pinned group that beats ambient evidence
//! - **QuarantineSeed**: Identities isolated from ordinary evidence-driven merging
//! - **Evidence**: One unit of input (transcript or feed record)
//!
//! ## Architecture
//!
//! - No I/O, no serialization formats
//! - Pure value types and invariants
//! - Trait definitions for the remote feed and geolocation collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod evidence;
pub mod geo;
pub mod group;
pub mod identity;
pub mod override_rule;
pub mod quarantine;
pub mod traits;

// Re-exports for convenience
pub use evidence::{Evidence, Observation, ParsedTranscript, RawBatch};
pub use geo::GeoInfo;
pub use group::GroupRecord;
pub use identity::{is_valid_ip, is_valid_ipv4, is_valid_ipv6, Identity, Timestamp};
pub use override_rule::OverrideRule;
pub use quarantine::QuarantineSeed;
