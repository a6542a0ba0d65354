//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while parsing evidence
///
/// Transcripts never produce errors (a non-matching transcript is `None`);
/// these are raised for feed batches, which are all-or-nothing.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The batch is valid JSON but not the expected shape
    #[error("Invalid batch format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
