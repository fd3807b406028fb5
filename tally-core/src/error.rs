//! Error types for the ledger core

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or invariant-violating payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Creating an entity id that already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Entity not found (or soft-deleted)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destructive directive rejected because the entity is referenced
    #[error("In use: {0}")]
    InUse(String),

    /// Storage error (SQLite)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
