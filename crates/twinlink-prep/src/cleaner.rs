//! Paired-record cleaning pass

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use twinlink_features::{raw_attribute, standard_features};
use twinlink_io::{DataColumn, Table, TwinConvention};

use crate::error::{PrepError, PrepResult};
use crate::standardize::{
    format_date, gender_code, is_digits, is_valid_date_format, normalize_city,
};

/// Cleaning configuration
///
/// Attribute names are base names; the twin suffixes are added according to
/// the detected (or configured) convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Identifier column, used in log messages (not serialized)
    #[serde(skip)]
    pub id_column: String,
    /// Twin suffix convention; detected from the table when unset (not serialized)
    #[serde(skip)]
    pub convention: Option<TwinConvention>,
    /// Attributes that identify a record for de-duplication
    pub key_attributes: Vec<String>,
    /// Attributes whose values must be all digits
    pub digit_attributes: Vec<String>,
    /// Date attributes, re-rendered in `date_format`
    pub date_attributes: Vec<String>,
    /// Output format for dates (strftime)
    pub date_format: String,
    /// Keep each date twin as read under `<attr>_raw`, for `dob_sim`
    pub keep_raw_dates: bool,
    /// Gender attribute, encoded as 1 (M) / 0 (F)
    pub gender_attribute: String,
    /// City attribute, upper-cased
    pub city_attribute: String,
    /// Also drop rows with nulls in the similarity engine's attributes
    pub require_engine_attributes: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            convention: None,
            key_attributes: vec!["identification_number".to_string(), "tax_number".to_string()],
            digit_attributes: vec!["tax_number".to_string()],
            date_attributes: vec!["date_of_birth".to_string(), "dob".to_string()],
            date_format: "%Y-%m-%d".to_string(),
            keep_raw_dates: true,
            gender_attribute: "gender".to_string(),
            city_attribute: "address_city".to_string(),
            require_engine_attributes: true,
        }
    }
}

/// Row counts of one cleaning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub null_rows_removed: usize,
    pub invalid_digit_rows_removed: usize,
    pub invalid_date_rows_removed: usize,
    pub output_rows: usize,
}

/// Cleans raw paired-record tables
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleanConfig,
}

impl Cleaner {
    pub fn new(config: CleanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean `table`, returning the cleaned copy and its row counts
    pub fn clean(&self, table: &Table) -> PrepResult<(Table, CleanReport)> {
        if !is_valid_date_format(&self.config.date_format) {
            return Err(PrepError::InvalidDateFormat(self.config.date_format.clone()));
        }
        let convention = match self.config.convention {
            Some(convention) => convention,
            None => TwinConvention::detect(table.schema()).ok_or(PrepError::NoTwinColumns)?,
        };
        debug!(%convention, "resolved twin convention");

        let mut report = CleanReport {
            input_rows: table.num_rows(),
            ..CleanReport::default()
        };

        // 1. duplicates on the key attributes
        let keys = twin_columns(table, convention, &self.config.key_attributes);
        if keys.is_empty() {
            warn!(
                attributes = ?self.config.key_attributes,
                "no key attribute twins present, skipping de-duplication"
            );
        }
        let mut table = self.drop_rows(table, "duplicate", first_occurrences(table, &keys));
        report.duplicates_removed = report.input_rows - table.num_rows();

        // 2. nulls in key and engine attributes
        let mut required = keys;
        if self.config.require_engine_attributes {
            for column in engine_columns(&table, convention) {
                if !required.contains(&column) {
                    required.push(column);
                }
            }
        }
        let before = table.num_rows();
        let keep = rows_where(&table, &required, |value| value.is_some());
        table = self.drop_rows(&table, "null value", keep);
        report.null_rows_removed = before - table.num_rows();

        // 3. non-digit values (nulls are left alone)
        let digits = twin_columns(&table, convention, &self.config.digit_attributes);
        let before = table.num_rows();
        let keep = rows_where(&table, &digits, |value| value.map_or(true, is_digits));
        table = self.drop_rows(&table, "non-digit value", keep);
        report.invalid_digit_rows_removed = before - table.num_rows();

        // 4. unparseable dates
        let dates = twin_columns(&table, convention, &self.config.date_attributes);
        let format = self.config.date_format.as_str();
        let before = table.num_rows();
        let keep = rows_where(&table, &dates, |value| {
            value.map_or(true, |v| format_date(v, format).is_some())
        });
        table = self.drop_rows(&table, "unparseable date", keep);
        report.invalid_date_rows_removed = before - table.num_rows();

        // 5. standardization
        if self.config.keep_raw_dates {
            table = keep_as_read(table, convention, &self.config.date_attributes)?;
        }
        for name in &dates {
            let column = map_text(table.require_column(name)?, |v| format_date(v, format));
            table = table.with_column(name.as_str(), column)?;
        }
        let genders = twin_columns(
            &table,
            convention,
            std::slice::from_ref(&self.config.gender_attribute),
        );
        for name in &genders {
            let data = table.require_column(name)?;
            let codes = (0..data.len())
                .map(|row| data.text(row).and_then(|v| gender_code(&v)))
                .collect();
            table = table.with_column(name.as_str(), DataColumn::Int64(codes))?;
        }
        let cities = twin_columns(
            &table,
            convention,
            std::slice::from_ref(&self.config.city_attribute),
        );
        for name in &cities {
            let column = map_text(table.require_column(name)?, |v| Some(normalize_city(v)));
            table = table.with_column(name.as_str(), column)?;
        }
        for name in engine_id_columns(&table, convention) {
            let column = map_text(table.require_column(&name)?, |v| Some(v.trim().to_string()));
            table = table.with_column(name, column)?;
        }

        report.output_rows = table.num_rows();
        info!(
            input_rows = report.input_rows,
            duplicates = report.duplicates_removed,
            nulls = report.null_rows_removed,
            invalid_digits = report.invalid_digit_rows_removed,
            invalid_dates = report.invalid_date_rows_removed,
            output_rows = report.output_rows,
            "cleaned paired records"
        );
        Ok((table, report))
    }

    /// Filter rows, logging the identifier of each dropped row
    fn drop_rows(&self, table: &Table, reason: &str, keep: Vec<bool>) -> Table {
        for (row, _) in keep.iter().enumerate().filter(|(_, k)| !**k) {
            let row_id = table
                .text(row, &self.config.id_column)
                .map(|s| s.into_owned())
                .unwrap_or_else(|| format!("#{}", row));
            debug!(row_id = %row_id, reason, "dropping row");
        }
        table.filter_rows(&keep)
    }
}

/// Twin column names of every listed attribute whose pair is present
fn twin_columns(table: &Table, convention: TwinConvention, bases: &[String]) -> Vec<String> {
    bases
        .iter()
        .map(|base| convention.twin_names(base))
        .filter(|(l, r)| table.schema().contains(l) && table.schema().contains(r))
        .flat_map(|(l, r)| [l, r])
        .collect()
}

/// Copy every present date twin to its `<attr>_raw` twin
///
/// Existing copies are left alone, so cleaning a cleaned table keeps the
/// original strings.
fn keep_as_read(
    mut table: Table,
    convention: TwinConvention,
    bases: &[String],
) -> PrepResult<Table> {
    for base in bases {
        let (left, right) = convention.twin_names(base);
        let (raw_left, raw_right) = convention.twin_names(&raw_attribute(base));
        for (name, raw) in [(left, raw_left), (right, raw_right)] {
            if !table.schema().contains(&name) || table.schema().contains(&raw) {
                continue;
            }
            let column = table.require_column(&name)?.clone();
            table = table.with_column(raw, column)?;
        }
    }
    Ok(table)
}

/// Twin columns the similarity engine will read, first accepted alias only
fn engine_columns(table: &Table, convention: TwinConvention) -> Vec<String> {
    standard_features(true, false)
        .iter()
        .filter(|spec| spec.required)
        .filter_map(|spec| {
            spec.attributes
                .iter()
                .map(|base| convention.twin_names(base))
                .find(|(l, r)| table.schema().contains(l) && table.schema().contains(r))
        })
        .flat_map(|(l, r)| [l, r])
        .fold(Vec::new(), |mut acc, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        })
}

/// Identification number twins, under either accepted name
fn engine_id_columns(table: &Table, convention: TwinConvention) -> Vec<String> {
    let bases = ["identification_number".to_string(), "id_num".to_string()];
    twin_columns(table, convention, &bases)
}

/// Keep mask selecting the first row of each distinct key
fn first_occurrences(table: &Table, keys: &[String]) -> Vec<bool> {
    if keys.is_empty() {
        return vec![true; table.num_rows()];
    }
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    (0..table.num_rows())
        .map(|row| {
            let key = keys
                .iter()
                .map(|name| table.text(row, name).map(|s| s.into_owned()))
                .collect();
            seen.insert(key)
        })
        .collect()
}

/// Keep mask of rows where `pred` holds for every listed column
fn rows_where<F>(table: &Table, columns: &[String], pred: F) -> Vec<bool>
where
    F: Fn(Option<&str>) -> bool,
{
    (0..table.num_rows())
        .map(|row| {
            columns
                .iter()
                .all(|name| pred(table.text(row, name).as_deref()))
        })
        .collect()
}

/// Map every non-null cell through `f`, producing a text column
fn map_text<F>(data: &DataColumn, f: F) -> DataColumn
where
    F: Fn(&str) -> Option<String>,
{
    DataColumn::String(
        (0..data.len())
            .map(|row| data.text(row).and_then(|v| f(&v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinlink_io::{CsvOptions, CsvReader};

    const HEADER: &str = "id,date_of_birth.1,date_of_birth.2,citizenship.1,citizenship.2,marital_status.1,marital_status.2,address_street.1,address_street.2,identification_number.1,identification_number.2,tax_number.1,tax_number.2";

    fn read(rows: &[&str]) -> Table {
        let csv = format!("{}\n{}\n", HEADER, rows.join("\n"));
        CsvReader::read_from(csv.as_bytes(), CsvOptions::default()).unwrap()
    }

    #[test]
    fn test_drops_duplicates_keeping_first() {
        let table = read(&[
            "1,1990-01-01,1990-01-01,US,US,s,s,a,a,A1,A1,11,11",
            "2,1991-01-01,1991-01-01,US,US,s,s,a,a,A1,A1,11,11",
            "3,1992-01-01,1992-01-01,US,US,s,s,a,a,A1,A1,11,12",
        ]);

        let (out, report) = Cleaner::default().clean(&table).unwrap();

        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(out.text(0, "id").as_deref(), Some("1"));
        assert_eq!(out.text(1, "id").as_deref(), Some("3"));
    }

    #[test]
    fn test_drops_null_and_non_digit_rows() {
        let table = read(&[
            "1,1990-01-01,1990-01-01,US,US,s,s,a,a,A1,A1,11,11",
            "2,1990-01-01,1990-01-01,,US,s,s,a,a,A2,A2,12,12",
            "3,1990-01-01,1990-01-01,US,US,s,s,a,a,A3,A3,1x,13",
        ]);

        let (out, report) = Cleaner::default().clean(&table).unwrap();

        assert_eq!(report.null_rows_removed, 1);
        assert_eq!(report.invalid_digit_rows_removed, 1);
        assert_eq!(report.output_rows, 1);
        assert_eq!(out.num_rows(), 1);
    }

    #[test]
    fn test_standardizes_dates_and_ids() {
        let table = read(&["1,15.06.1980,1980/06/16,US,US,s,s,a,a, A1 ,A1,0042,0042"]);

        let (out, _) = Cleaner::default().clean(&table).unwrap();

        assert_eq!(out.text(0, "date_of_birth.1").as_deref(), Some("1980-06-15"));
        assert_eq!(out.text(0, "date_of_birth.2").as_deref(), Some("1980-06-16"));
        assert_eq!(out.text(0, "identification_number.1").as_deref(), Some("A1"));
        // leading zeros survive
        assert_eq!(out.text(0, "tax_number.1").as_deref(), Some("0042"));
    }

    #[test]
    fn test_dates_as_read_are_kept() {
        let table = read(&["1,01/02/1990,1990-01-02,US,US,s,s,a,a,A1,A1,11,11"]);

        let (out, _) = Cleaner::default().clean(&table).unwrap();

        assert_eq!(out.text(0, "date_of_birth.1").as_deref(), Some("1990-01-02"));
        assert_eq!(out.text(0, "date_of_birth_raw.1").as_deref(), Some("01/02/1990"));
        assert_eq!(out.text(0, "date_of_birth_raw.2").as_deref(), Some("1990-01-02"));

        // a second pass keeps the strings of the first
        let (again, _) = Cleaner::default().clean(&out).unwrap();
        assert_eq!(again.text(0, "date_of_birth_raw.1").as_deref(), Some("01/02/1990"));

        let cleaner = Cleaner::new(CleanConfig {
            keep_raw_dates: false,
            ..CleanConfig::default()
        });
        let (plain, _) = cleaner.clean(&table).unwrap();
        assert!(plain.column("date_of_birth_raw.1").is_none());
    }

    #[test]
    fn test_unparseable_date_rows_are_dropped() {
        let table = read(&[
            "1,yesterday,1990-01-01,US,US,s,s,a,a,A1,A1,11,11",
            "2,1990-01-01,1990-01-01,US,US,s,s,a,a,A2,A2,12,12",
        ]);

        let (out, report) = Cleaner::default().clean(&table).unwrap();

        assert_eq!(report.invalid_date_rows_removed, 1);
        assert_eq!(out.text(0, "id").as_deref(), Some("2"));
    }

    #[test]
    fn test_gender_and_city() {
        let csv = "id,gender_x,gender_y,address_city_x,address_city_y\n1,M,f,berlin,Paris\n2,X,F,rome,oslo\n";
        let table = CsvReader::read_from(csv.as_bytes(), CsvOptions::default()).unwrap();
        let cleaner = Cleaner::new(CleanConfig {
            require_engine_attributes: false,
            ..CleanConfig::default()
        });

        let (out, report) = cleaner.clean(&table).unwrap();

        assert_eq!(report.output_rows, 2);
        assert_eq!(out.column("gender_x"), Some(&DataColumn::Int64(vec![Some(1), None])));
        assert_eq!(out.column("gender_y"), Some(&DataColumn::Int64(vec![Some(0), Some(0)])));
        assert_eq!(out.text(0, "address_city_x").as_deref(), Some("BERLIN"));
        assert_eq!(out.text(1, "address_city_y").as_deref(), Some("OSLO"));
    }

    #[test]
    fn test_no_twins_is_error() {
        let table = CsvReader::read_from("id,a\n1,2\n".as_bytes(), CsvOptions::default()).unwrap();
        assert!(matches!(
            Cleaner::default().clean(&table),
            Err(PrepError::NoTwinColumns)
        ));
    }

    #[test]
    fn test_invalid_date_format_is_error() {
        let table = read(&["1,1990-01-01,1990-01-01,US,US,s,s,a,a,A1,A1,11,11"]);
        let cleaner = Cleaner::new(CleanConfig {
            date_format: "%Q".to_string(),
            ..CleanConfig::default()
        });
        assert!(matches!(
            cleaner.clean(&table),
            Err(PrepError::InvalidDateFormat(_))
        ));

        // renders, but drops the day
        let cleaner = Cleaner::new(CleanConfig {
            date_format: "%m/%Y".to_string(),
            ..CleanConfig::default()
        });
        assert!(matches!(
            cleaner.clean(&table),
            Err(PrepError::InvalidDateFormat(_))
        ));
    }
}
