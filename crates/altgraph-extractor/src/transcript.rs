//! Parse alt-lookup bot transcripts
//!
//! ```text
//! alice has 3 alts:
//! -> alice
//! -> bob
//! -> carol
//! On 2 IPs:
//! -> 1.2.3.4
//! -> 2001:db8::1
//! ```
//!
//! The IP patterns deliberately over-match; every token must pass
//! [`is_valid_ip`] before it is accepted.

use altgraph_domain::{is_valid_ipv4, is_valid_ipv6, ParsedTranscript, Timestamp};
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\S+) has \d+ alts:").expect("anchor pattern is valid"));

static IP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^On \d+ IPs:").expect("IP header pattern is valid"));

static ENTRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^-> (\S+)[ \t\r]*$").expect("entry pattern is valid"));

static IPV4_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-> ((?:\d{1,3}\.){3}\d{1,3})").expect("IPv4 pattern is valid")
});

static IPV6_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-> ([0-9a-fA-F:]+(?::[0-9a-fA-F]+)*)").expect("IPv6 pattern is valid")
});

/// Cheap pre-check: does `text` contain the `"<user> has N alts:"` anchor?
pub fn looks_like_transcript(text: &str) -> bool {
    ANCHOR.is_match(text)
}

/// Parse a transcript, stamping it with the current time
///
/// Returns `None` when the anchor line is absent.
///
/// # Examples
///
/// ```
/// use altgraph_extractor::parse_transcript;
///
/// let parsed = parse_transcript("alice has 1 alts:\n-> bob\nOn 1 IPs:\n-> 1.2.3.4").unwrap();
/// assert_eq!(parsed.main, "alice");
/// assert_eq!(parsed.alts, vec!["bob"]);
/// assert_eq!(parsed.ips, vec!["1.2.3.4"]);
///
/// assert!(parse_transcript("hello there").is_none());
/// ```
pub fn parse_transcript(text: &str) -> Option<ParsedTranscript> {
    parse_transcript_at(text, Utc::now())
}

/// Parse a transcript with an explicit timestamp
pub fn parse_transcript_at(text: &str, timestamp: Timestamp) -> Option<ParsedTranscript> {
    let anchor = ANCHOR.captures(text)?;
    let main = anchor.get(1)?.as_str().to_string();
    let body = &text[anchor.get(0)?.end()..];

    let (alt_section, ip_section) = match IP_HEADER.find(body) {
        Some(header) => {
            let rest = &body[header.end()..];
            let ip_end = rest.find("\n\n").unwrap_or(rest.len());
            (&body[..header.start()], Some(&rest[..ip_end]))
        }
        None => (body, None),
    };

    let mut alts: Vec<String> = ENTRY_LINE
        .captures_iter(alt_section)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    if alts.is_empty() {
        alts.push(main.clone());
    }

    let ips = ip_section.map(extract_ips).unwrap_or_default();

    Some(ParsedTranscript {
        main,
        alts,
        ips,
        timestamp,
    })
}

/// Pull validated IPs out of the IP section, IPv4 first, without duplicates
fn extract_ips(section: &str) -> Vec<String> {
    let v4 = IPV4_TOKEN
        .captures_iter(section)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|token| is_valid_ipv4(token));
    let v6 = IPV6_TOKEN
        .captures_iter(section)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|token| is_valid_ipv6(token));

    let mut ips: Vec<String> = Vec::new();
    for token in v4.chain(v6) {
        if !ips.iter().any(|existing| existing == token) {
            ips.push(token.to_string());
        }
    }
    ips
}
