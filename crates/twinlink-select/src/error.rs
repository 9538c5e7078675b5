//! Error types for feature selection

use thiserror::Error;
use twinlink_io::IoError;

/// Result type alias for selection operations
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

/// Errors raised while fitting or applying a feature selection
///
/// All of them are fatal for a run.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// A required column (identifier or label) is absent
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// No candidate feature columns remain after excluding id and label
    #[error("No feature columns to select from")]
    EmptyFeatureSet,

    /// The label takes a single value on the fitting rows
    #[error("Label column has a single class ({0}); nothing to discriminate")]
    ConstantLabel(String),

    /// The forest assigned zero importance to every feature
    #[error("All feature importances are zero; no tree found a useful split")]
    DegenerateImportances,

    /// The threshold lies above every importance
    #[error("No feature reaches the threshold {threshold} (highest importance {max_importance})")]
    EmptySelection { threshold: f64, max_importance: f64 },

    /// A feature cell is null or not a number
    #[error("Row {row_id}: feature column {column} is not numeric")]
    NonNumericFeature { column: String, row_id: String },

    /// A label cell is null
    #[error("Row {row_id}: missing label")]
    MissingLabel { row_id: String },

    /// Too few rows to partition or fit
    #[error("Too few rows: {rows} (need at least {required})")]
    TooFewRows { rows: usize, required: usize },

    /// A threshold expression could not be parsed
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A numeric parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Table construction failed
    #[error("Table error: {0}")]
    Table(#[from] IoError),

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
