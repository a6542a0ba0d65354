//! Error types for the CLI application.

use altgraph_extractor::ExtractorError;
use altgraph_refresh::RefreshError;
use altgraph_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Refresh cycle error
    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),

    /// Snapshot or cache error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Malformed batch file
    #[error("Batch error: {0}")]
    Extractor(#[from] ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nothing matched
    #[error("Not found: {0}")]
    NotFound(String),
}
