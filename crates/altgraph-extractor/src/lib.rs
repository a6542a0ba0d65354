//! altgraph Extractor
//!
//! Turns raw evidence into the normalized form the resolver consumes.
//!
//! # Overview
//!
//! Two evidence shapes are supported:
//!
//! - **Transcripts**: text replies from an alt-lookup bot
//!   (`"<user> has N alts:"`, `-> alt` lines, `On M IPs:`, `-> ip` lines)
//! - **Feed batches**: JSON objects mapping an identifier (usually an IP) to
//!   the identities observed with it
//!
//! # Architecture
//!
//! ```text
//! text  → parse_transcript → Evidence::Transcript  ┐
//!                                                  ├→ Observation → MergeEngine
//! JSON  → parse_batch      → Evidence::BatchRecord ┘
//! ```
//!
//! # Example Usage
//!
//! ```
//! use altgraph_extractor::{parse_transcript, to_evidence};
//!
//! let parsed = parse_transcript("alice has 1 alts:\n-> bob").unwrap();
//! let observation = to_evidence(parsed).into_observation();
//! assert!(observation.members.contains("alice"));
//! assert!(observation.members.contains("bob"));
//! ```

#![warn(missing_docs)]

mod batch;
mod error;
mod transcript;


pub use batch::{parse_batch, parse_batch_value};
pub use error::ExtractorError;
pub use transcript::{looks_like_transcript, parse_transcript, parse_transcript_at};

use altgraph_domain::{Evidence, ParsedTranscript};

/// Wrap a parsed transcript as evidence
pub fn to_evidence(parsed: ParsedTranscript) -> Evidence {
    Evidence::Transcript(parsed)
}
