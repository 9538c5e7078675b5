//! twinlink-prep - Cleaning of paired-record tables
//!
//! Turns a raw suspect table (two individuals per row) into the cleaned
//! input the similarity engine expects:
//!
//! 1. detect the twin suffix convention
//! 2. drop duplicate rows on the key attributes, keeping the first
//! 3. drop rows with nulls in key or engine attributes
//! 4. drop rows whose tax numbers are not all digits
//! 5. standardize dates, gender codes and city names, keeping each date
//!    twin as read under `<attr>_raw`
//!
//! Every step is counted in a [`CleanReport`].

mod cleaner;
mod error;
mod standardize;

pub use cleaner::{CleanConfig, CleanReport, Cleaner};
pub use error::{PrepError, PrepResult};
pub use standardize::{format_date, gender_code, is_valid_date_format, normalize_city};
