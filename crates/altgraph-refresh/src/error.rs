//! Error types for refresh operations

use altgraph_extractor::ExtractorError;
use altgraph_store::StoreError;
use thiserror::Error;

/// Errors that can occur during a refresh cycle
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The remote feed could not be fetched
    #[error("Feed error: {0}")]
    Feed(String),

    /// The fetched or supplied batch was malformed
    #[error("Parse error: {0}")]
    Parse(#[from] ExtractorError),

    /// The snapshot could not be written; in-memory state is kept
    #[error("Persist error: {0}")]
    Persist(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
