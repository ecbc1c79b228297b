//! Error types for halostat

use thiserror::Error;

/// Halostat error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error: unknown name or malformed spec
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error: caller-supplied data violates a precondition
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error: numerical failure (singular matrix, empty table)
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
