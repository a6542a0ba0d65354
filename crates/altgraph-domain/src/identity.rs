//! Identity module - string keys and IP address validation
//!
//! Identities are untyped strings. The only structure the engine cares about
//! is whether a string is a syntactically valid IP address, because only valid
//! IPs may enter a group's `ips` set.

use chrono::{DateTime, Utc};
use std::net::{Ipv4Addr, Ipv6Addr};

/// A username or textual IP address
pub type Identity = String;

/// Instant used for `first_seen` / `last_updated`
pub type Timestamp = DateTime<Utc>;

/// Check whether `candidate` is a dotted-quad IPv4 address
///
/// # Examples
///
/// ```
/// use altgraph_domain::is_valid_ipv4;
///
/// assert!(is_valid_ipv4("193.32.248.162"));
/// assert!(!is_valid_ipv4("300.1.1.1"));
/// assert!(!is_valid_ipv4("alice"));
/// ```
pub fn is_valid_ipv4(candidate: &str) -> bool {
    candidate.parse::<Ipv4Addr>().is_ok()
}

/// Check whether `candidate` is an IPv6 address
///
/// Accepts full, compressed and IPv4-embedded forms, plus link-local
/// addresses carrying a zone suffix (`fe80::1%eth0`).
///
/// # Examples
///
/// ```
/// use altgraph_domain::is_valid_ipv6;
///
/// assert!(is_valid_ipv6("2001:db8::1"));
/// assert!(is_valid_ipv6("fe80::1%eth0"));
/// assert!(!is_valid_ipv6("dead:beef"));
/// ```
pub fn is_valid_ipv6(candidate: &str) -> bool {
    match candidate.split_once('%') {
        Some((addr, zone)) => {
            let zone_ok = !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphanumeric());
            zone_ok
                && addr
                    .parse::<Ipv6Addr>()
                    .map(|ip| ip.segments()[0] & 0xffc0 == 0xfe80)
                    .unwrap_or(false)
        }
        None => candidate.parse::<Ipv6Addr>().is_ok(),
    }
}

/// Check whether `candidate` is an IPv4 or IPv6 address
pub fn is_valid_ip(candidate: &str) -> bool {
    is_valid_ipv4(candidate) || is_valid_ipv6(candidate)
}
