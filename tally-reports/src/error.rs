//! Error types for the reporting engine

use thiserror::Error;

/// Result type for report queries
pub type Result<T> = std::result::Result<T, Error>;

/// Reporting errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger core error
    #[error("Ledger error: {0}")]
    Core(#[from] tally_core::Error),

    /// Malformed date range, rejected before querying
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}
