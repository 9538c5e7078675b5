//! CSV writer: one record per row, header first, nulls as empty cells

use crate::reader::{IoError, IoResult};
use crate::schema::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes tables as delimited text
#[derive(Debug, Clone, Copy)]
pub struct CsvWriter {
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWriter {
    /// Create a writer with the given delimiter
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write a table to a file, creating parent directories as needed
    pub fn write_path(&self, table: &Table, path: impl AsRef<Path>) -> IoResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        self.write_to(table, BufWriter::new(file))
    }

    /// Write a table to any byte sink
    pub fn write_to<W: Write>(&self, table: &Table, sink: W) -> IoResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        writer
            .write_record(table.column_names())
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;

        let columns: Vec<_> = table.columns().map(|(_, data)| data).collect();
        for row in 0..table.num_rows() {
            let record = columns
                .iter()
                .map(|c| c.text(row).map(|s| s.into_owned()).unwrap_or_default());
            writer
                .write_record(record)
                .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Render a table to a string
    pub fn to_string(&self, table: &Table) -> IoResult<String> {
        let mut buffer = Vec::new();
        self.write_to(table, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| IoError::WriteFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::{CsvOptions, CsvReader};
    use crate::reader::DataReader;
    use crate::schema::DataColumn;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("id", DataColumn::Int64(vec![Some(1), Some(2)])),
            ("citizenship_sim", DataColumn::Float64(vec![Some(1.0), None])),
            (
                "address",
                DataColumn::String(vec![Some("1 Main St, Apt 2".into()), Some("x".into())]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_to_string_quotes_delimiters() {
        let text = CsvWriter::default().to_string(&sample()).unwrap();
        assert_eq!(
            text,
            "id,citizenship_sim,address\n1,1.0,\"1 Main St, Apt 2\"\n2,,x\n"
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        CsvWriter::default().write_path(&sample(), &path).unwrap();

        let reader = CsvReader::open_with_options(path.to_str().unwrap(), CsvOptions::typed())
            .unwrap();
        let table = reader.read_table().unwrap();
        assert_eq!(table, sample());
    }
}
