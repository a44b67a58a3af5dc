//! Shared error type for the Shelfmark workspace.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the catalog storage and configuration layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying SQLite failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure while bootstrapping the root folder or database
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested record or pending batch does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure that is not the caller's fault and has no recovery path
    #[error("Internal error: {0}")]
    Internal(String),
}
