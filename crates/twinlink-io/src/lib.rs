//! twinlink-io - Tabular data I/O for paired-record datasets
//!
//! This crate provides the interchange format shared by every pipeline stage:
//!
//! - **Table**: ordered, typed, nullable columns with immutable transforms
//! - **CSV**: delimited text reader with type inference, and a writer
//! - **Twin conventions**: `_x`/`_y` and `.1`/`.2` attribute suffixes
//!
//! # Design
//!
//! Readers implement the `DataReader` trait for uniform access. Table
//! operations never mutate their receiver in place; each stage maps an
//! input table to a new output table.

pub mod csv_reader;
pub mod csv_writer;
pub mod reader;
pub mod schema;
pub mod twin;

pub use csv_reader::{CsvOptions, CsvReader};
pub use csv_writer::CsvWriter;
pub use reader::*;
pub use schema::*;
pub use twin::{Side, TwinConvention};
