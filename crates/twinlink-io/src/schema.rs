//! Schema, column and table types for data representation

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

use crate::reader::{IoError, IoResult};

/// Schema describing the columns of a table, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column descriptors
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// Create a new schema
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Whether a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Descriptor for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Data type
    pub dtype: ColumnType,

    /// Description
    pub description: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Float64,
    Int64,
    String,
}

impl ColumnType {
    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Float64 | ColumnType::Int64)
    }
}

/// A column of nullable values
#[derive(Debug, Clone, PartialEq)]
pub enum DataColumn {
    Float64(Vec<Option<f64>>),
    Int64(Vec<Option<i64>>),
    String(Vec<Option<String>>),
}

impl DataColumn {
    /// Get the column type
    pub fn dtype(&self) -> ColumnType {
        match self {
            DataColumn::Float64(_) => ColumnType::Float64,
            DataColumn::Int64(_) => ColumnType::Int64,
            DataColumn::String(_) => ColumnType::String,
        }
    }

    /// Get the number of elements
    pub fn len(&self) -> usize {
        match self {
            DataColumn::Float64(v) => v.len(),
            DataColumn::Int64(v) => v.len(),
            DataColumn::String(v) => v.len(),
        }
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the value at `row` is null (out-of-range rows count as null)
    pub fn is_null(&self, row: usize) -> bool {
        match self {
            DataColumn::Float64(v) => !matches!(v.get(row), Some(Some(_))),
            DataColumn::Int64(v) => !matches!(v.get(row), Some(Some(_))),
            DataColumn::String(v) => !matches!(v.get(row), Some(Some(_))),
        }
    }

    /// Number of null values
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// Render the value at `row` as text, `None` when null
    pub fn text(&self, row: usize) -> Option<Cow<'_, str>> {
        match self {
            DataColumn::Float64(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|x| Cow::Owned(format_float(x))),
            DataColumn::Int64(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|x| Cow::Owned(x.to_string())),
            DataColumn::String(v) => v
                .get(row)
                .and_then(|s| s.as_deref())
                .map(Cow::Borrowed),
        }
    }

    /// Convert to f64 values
    ///
    /// String cells are parsed. Returns `Err(row)` with the first row whose
    /// non-null value is not numeric.
    pub fn to_f64(&self) -> Result<Vec<Option<f64>>, usize> {
        match self {
            DataColumn::Float64(v) => Ok(v.clone()),
            DataColumn::Int64(v) => Ok(v.iter().map(|x| x.map(|x| x as f64)).collect()),
            DataColumn::String(v) => v
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell {
                    None => Ok(None),
                    Some(s) => s.trim().parse::<f64>().map(Some).map_err(|_| row),
                })
                .collect(),
        }
    }

    /// Gather the given rows, in order
    pub fn take(&self, indices: &[usize]) -> DataColumn {
        fn gather<T: Clone>(values: &[Option<T>], indices: &[usize]) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|&i| values.get(i).cloned().flatten())
                .collect()
        }

        match self {
            DataColumn::Float64(v) => DataColumn::Float64(gather(v, indices)),
            DataColumn::Int64(v) => DataColumn::Int64(gather(v, indices)),
            DataColumn::String(v) => DataColumn::String(gather(v, indices)),
        }
    }
}

/// Format a float the way tabular tools write them: whole numbers keep
/// one decimal place, everything else uses the shortest exact repr.
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// An ordered collection of equally long named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    schema: TableSchema,
    columns: Vec<DataColumn>,
    num_rows: usize,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns
    ///
    /// All columns must have the same length and distinct names.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, DataColumn)>) -> IoResult<Self> {
        columns
            .into_iter()
            .try_fold(Table::new(), |table, (name, data)| {
                let name = name.into();
                if table.schema.contains(&name) {
                    return Err(IoError::DuplicateColumn(name));
                }
                table.with_column(name, data)
            })
    }

    /// The table schema
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.column_names()
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.schema.column_index(name).map(|i| &self.columns[i])
    }

    /// Get a column by name, failing with `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> IoResult<&DataColumn> {
        self.column(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }

    /// Iterate over descriptors and their data
    pub fn columns(&self) -> impl Iterator<Item = (&ColumnDescriptor, &DataColumn)> {
        self.schema.columns.iter().zip(self.columns.iter())
    }

    /// Render a single cell as text
    pub fn text(&self, row: usize, column: &str) -> Option<Cow<'_, str>> {
        self.column(column).and_then(|c| c.text(row))
    }

    /// Return a table with `data` appended as `name`, or replacing the
    /// existing column of that name in place
    pub fn with_column(mut self, name: impl Into<String>, data: DataColumn) -> IoResult<Self> {
        let name = name.into();
        if !self.columns.is_empty() && data.len() != self.num_rows {
            return Err(IoError::LengthMismatch {
                column: name,
                expected: self.num_rows,
                actual: data.len(),
            });
        }
        if self.columns.is_empty() {
            self.num_rows = data.len();
        }

        let descriptor = ColumnDescriptor::new(name.clone(), data.dtype());
        match self.schema.column_index(&name) {
            Some(i) => {
                self.schema.columns[i] = descriptor;
                self.columns[i] = data;
            }
            None => {
                self.schema.columns.push(descriptor);
                self.columns.push(data);
            }
        }
        Ok(self)
    }

    /// Return a copy without the named columns (unknown names are ignored)
    pub fn without_columns(&self, names: &[&str]) -> Table {
        let drop: HashSet<&str> = names.iter().copied().collect();
        let (descriptors, columns) = self
            .columns()
            .filter(|(desc, _)| !drop.contains(desc.name.as_str()))
            .map(|(desc, data)| (desc.clone(), data.clone()))
            .unzip();

        Table {
            schema: TableSchema::new(descriptors),
            columns,
            num_rows: self.num_rows,
        }
    }

    /// Return a copy holding only the named columns, in the given order
    pub fn select_columns(&self, names: &[&str]) -> IoResult<Table> {
        let mut table = Table {
            num_rows: self.num_rows,
            ..Table::default()
        };
        for name in names {
            let data = self.require_column(name)?;
            if table.schema.contains(name) {
                return Err(IoError::DuplicateColumn(name.to_string()));
            }
            table.schema.columns.push(ColumnDescriptor::new(*name, data.dtype()));
            table.columns.push(data.clone());
        }
        Ok(table)
    }

    /// Return a table with one column renamed
    pub fn rename_column(mut self, from: &str, to: &str) -> IoResult<Self> {
        let i = self
            .schema
            .column_index(from)
            .ok_or_else(|| IoError::ColumnNotFound(from.to_string()))?;
        if from != to && self.schema.contains(to) {
            return Err(IoError::DuplicateColumn(to.to_string()));
        }
        self.schema.columns[i].name = to.to_string();
        Ok(self)
    }

    /// Gather the given rows, in order
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            schema: self.schema.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            num_rows: indices.len(),
        }
    }

    /// Keep the rows where `keep` is true
    pub fn filter_rows(&self, keep: &[bool]) -> Table {
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.take_rows(&indices)
    }
}
