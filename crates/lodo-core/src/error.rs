//! Error types for lodo-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using lodo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lodo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote snapshot could not be fetched, so the sync pass was aborted
    #[error("Sync aborted, could not pull remote records: {0}")]
    Pull(#[source] RemoteError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
