//! Error types for the similarity feature engine

use thiserror::Error;
use twinlink_io::IoError;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while deriving similarity features
///
/// Every variant is a precondition violation on the input table; none is
/// recoverable within a run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The identifier column is absent
    #[error("Identifier column not found: {0}")]
    MissingIdColumn(String),

    /// No column pair follows a known twin suffix convention
    #[error("No twin attribute columns found (expected _x/_y or .1/.2 suffixes)")]
    NoTwinColumns,

    /// A required feature has no twin columns for any accepted attribute name
    #[error("Feature {feature} requires twin columns for one of {attributes:?}")]
    MissingColumn {
        feature: String,
        attributes: Vec<String>,
    },

    /// A twin value is null
    #[error("Row {row_id}: null value in column {column}")]
    MissingValue { row_id: String, column: String },

    /// A twin value cannot be interpreted by the feature's metric
    #[error("Row {row_id}: invalid value {value:?} in column {column}: {reason}")]
    InvalidValue {
        row_id: String,
        column: String,
        value: String,
        reason: String,
    },

    /// Table construction failed
    #[error("Table error: {0}")]
    Table(#[from] IoError),
}
