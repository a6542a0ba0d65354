//! Parse remote feed batches (`identifier -> [members]`)

use crate::error::ExtractorError;
use altgraph_domain::RawBatch;
use serde_json::Value;
use tracing::warn;

/// Parse a feed batch from JSON text
///
/// The batch is all-or-nothing: a non-object root or a non-array record
/// rejects the whole batch. Non-string members inside an array are skipped.
///
/// # Examples
///
/// ```
/// use altgraph_extractor::parse_batch;
///
/// let batch = parse_batch(r#"{"1.2.3.4": ["alice", "bob"]}"#).unwrap();
/// assert_eq!(batch["1.2.3.4"], vec!["alice", "bob"]);
///
/// assert!(parse_batch(r#"["alice"]"#).is_err());
/// ```
pub fn parse_batch(json: &str) -> Result<RawBatch, ExtractorError> {
    let value: Value = serde_json::from_str(json.trim())?;
    parse_batch_value(value)
}

/// Parse a feed batch from an already-decoded JSON value
pub fn parse_batch_value(value: Value) -> Result<RawBatch, ExtractorError> {
    let Value::Object(object) = value else {
        return Err(ExtractorError::InvalidFormat(
            "Expected a JSON object at root".to_string(),
        ));
    };

    let mut batch = RawBatch::new();
    for (identifier, members) in object {
        let Value::Array(members) = members else {
            return Err(ExtractorError::InvalidFormat(format!(
                "Record '{}' is not an array",
                identifier
            )));
        };

        let mut parsed = Vec::with_capacity(members.len());
        for (idx, member) in members.into_iter().enumerate() {
            match member {
                Value::String(name) => parsed.push(name),
                other => warn!(
                    "Skipping non-string member {} of record '{}': {}",
                    idx, identifier, other
                ),
            }
        }
        batch.insert(identifier, parsed);
    }

    Ok(batch)
}
