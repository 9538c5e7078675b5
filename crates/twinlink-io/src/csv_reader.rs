//! CSV file reader with type inference

use crate::reader::{DataReader, IoError, IoResult};
use crate::schema::{ColumnDescriptor, ColumnType, DataColumn, Table, TableSchema};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Cell spellings treated as null, besides the empty cell
const NULL_MARKERS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Options controlling how delimited text is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Whether the first record is a header row
    pub has_header: bool,
    /// Infer Int64/Float64 columns; when false every column is String
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            infer_types: false,
        }
    }
}

impl CsvOptions {
    /// Default options with type inference enabled
    pub fn typed() -> Self {
        Self {
            infer_types: true,
            ..Self::default()
        }
    }
}

/// CSV file reader
pub struct CsvReader {
    path: String,
    options: CsvOptions,
}

impl CsvReader {
    /// Open a CSV file with default options (all columns as text)
    pub fn open(path: &str) -> IoResult<Self> {
        Self::open_with_options(path, CsvOptions::default())
    }

    /// Open a CSV file with options
    pub fn open_with_options(path: &str, options: CsvOptions) -> IoResult<Self> {
        if !Path::new(path).exists() {
            return Err(IoError::FileNotFound(path.to_string()));
        }

        Ok(Self {
            path: path.to_string(),
            options,
        })
    }

    /// Parse a table from any byte source
    pub fn read_from<R: Read>(source: R, options: CsvOptions) -> IoResult<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_header)
            .from_reader(source);

        let mut headers = if options.has_header {
            reader
                .headers()
                .map_err(|e| IoError::InvalidFormat(e.to_string()))?
                .iter()
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;

            if headers.is_empty() {
                // Generate column names from the first record's width
                headers = (0..record.len()).map(|i| format!("col_{}", i)).collect();
                cells = vec![Vec::new(); headers.len()];
            }

            for (i, value) in record.iter().enumerate() {
                if i < cells.len() {
                    cells[i].push(parse_cell(value));
                }
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                let dtype = if options.infer_types {
                    infer_type(&values)
                } else {
                    ColumnType::String
                };
                (name, parse_column(values, dtype))
            })
            .collect::<Vec<_>>();

        Table::from_columns(columns)
    }

    fn open_file(&self) -> IoResult<BufReader<File>> {
        let file = File::open(&self.path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        Ok(BufReader::new(file))
    }
}

impl DataReader for CsvReader {
    fn read_schema(&self) -> IoResult<TableSchema> {
        Ok(self.read_table()?.schema().clone())
    }

    fn read_table(&self) -> IoResult<Table> {
        Self::read_from(self.open_file()?, self.options)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Map a raw cell to `None` when it spells a null
fn parse_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || NULL_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Infer column type from its non-null values
fn infer_type(values: &[Option<String>]) -> ColumnType {
    let non_null: Vec<&str> = values.iter().flatten().map(|s| s.trim()).collect();
    if non_null.is_empty() {
        return ColumnType::String;
    }

    if non_null.iter().all(|s| s.parse::<i64>().is_ok()) {
        return ColumnType::Int64;
    }

    if non_null.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ColumnType::Float64;
    }

    ColumnType::String
}

/// Parse column values into a DataColumn of the inferred type
fn parse_column(values: Vec<Option<String>>, dtype: ColumnType) -> DataColumn {
    match dtype {
        ColumnType::Float64 => DataColumn::Float64(
            values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect(),
        ),
        ColumnType::Int64 => DataColumn::Int64(
            values
                .iter()
                .map(|v| v.as_deref().and_then(|s| s.trim().parse().ok()))
                .collect(),
        ),
        ColumnType::String => DataColumn::String(values),
    }
}
