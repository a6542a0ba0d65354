//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the resolution engine and the
//! network. Implementations live in `altgraph-refresh`.

use crate::evidence::RawBatch;
use crate::geo::GeoInfo;
use std::collections::BTreeMap;
use std::future::Future;

/// Source of remote evidence batches
///
/// Implemented by the infrastructure layer (HTTP feed) and by test mocks.
pub trait FeedSource {
    /// Error type for fetch operations
    type Error: std::fmt::Display;

    /// Fetch the current batch
    ///
    /// A failure must leave no partial result behind: the caller aborts the
    /// whole refresh cycle.
    fn fetch(&self) -> impl Future<Output = Result<RawBatch, Self::Error>> + Send;
}

/// Geolocation lookup for IP addresses
///
/// Implemented by the infrastructure layer (ip-api client) and by test mocks.
pub trait GeoLookup {
    /// Error type for lookup operations
    type Error: std::fmt::Display;

    /// Look up a set of IPs
    ///
    /// Implementations batch and pace requests as the upstream requires.
    /// IPs the upstream could not resolve are simply absent from the result.
    fn fetch_batch(
        &self,
        ips: &[String],
    ) -> impl Future<Output = Result<BTreeMap<String, GeoInfo>, Self::Error>> + Send;
}
