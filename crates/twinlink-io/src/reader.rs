//! Data reader trait and common types
//!
//! The `DataReader` trait provides a uniform interface for loading
//! paired-record tables from delimited text files.

use crate::csv_reader::{CsvOptions, CsvReader};
use crate::schema::{DataColumn, Table, TableSchema};
use thiserror::Error;

/// Errors that can occur during I/O and table operations
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to open file: {0}")]
    OpenFailed(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

/// Result type for I/O operations
pub type IoResult<T> = Result<T, IoError>;

/// Trait for reading tabular data from a file format
pub trait DataReader {
    /// Read the schema (column names and inferred types)
    fn read_schema(&self) -> IoResult<TableSchema>;

    /// Read a single column by name
    fn read_column(&self, name: &str) -> IoResult<DataColumn> {
        let table = self.read_table()?;
        table.require_column(name).cloned()
    }

    /// Read every record into a table
    fn read_table(&self) -> IoResult<Table>;

    /// Get the file path (if applicable)
    fn path(&self) -> Option<&str> {
        None
    }

    /// Get the format name
    fn format_name(&self) -> &'static str;
}

/// A boxed reader for dynamic dispatch
pub type BoxedReader = Box<dyn DataReader>;

/// Open a file and return an appropriate reader
///
/// The format is detected from the file extension. `.tsv` files override
/// the configured delimiter with a tab.
pub fn open_file(path: &str, options: CsvOptions) -> IoResult<BoxedReader> {
    let extension = path
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => Ok(Box::new(CsvReader::open_with_options(path, options)?)),
        "tsv" => Ok(Box::new(CsvReader::open_with_options(
            path,
            CsvOptions {
                delimiter: b'\t',
                ..options
            },
        )?)),
        _ => Err(IoError::InvalidFormat(format!(
            "Unknown file extension: {}",
            extension
        ))),
    }
}

/// List supported file extensions
pub fn supported_extensions() -> Vec<&'static str> {
    vec!["csv", "tsv", "txt"]
}
