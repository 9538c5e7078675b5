//! Error types for twinlink-core

use thiserror::Error;
use twinlink_features::EngineError;
use twinlink_io::IoError;
use twinlink_prep::PrepError;
use twinlink_select::SelectionError;

use crate::config::ConfigError;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Reading or writing tables
    #[error("Table I/O error: {0}")]
    Io(#[from] IoError),

    /// Cleaning stage
    #[error("Cleaning error: {0}")]
    Prep(#[from] PrepError),

    /// Feature engine stage
    #[error("Feature engine error: {0}")]
    Engine(#[from] EngineError),

    /// Selection stage
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem access outside table I/O
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
}
