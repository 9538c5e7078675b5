//! Error types for record cleaning

use thiserror::Error;
use twinlink_io::IoError;

/// Result type alias for cleaning operations
pub type PrepResult<T> = std::result::Result<T, PrepError>;

/// Errors raised while cleaning a paired-record table
#[derive(Error, Debug)]
pub enum PrepError {
    /// No column pair follows a known twin suffix convention
    #[error("No twin attribute columns found (expected _x/_y or .1/.2 suffixes)")]
    NoTwinColumns,

    /// The configured date format cannot render a date
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    /// Table construction failed
    #[error("Table error: {0}")]
    Table(#[from] IoError),
}
