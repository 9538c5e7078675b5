//! Numeric view of a feature table for model fitting

use std::collections::BTreeSet;
use twinlink_io::Table;

use crate::error::{SelectionError, SelectionResult};

/// Row-major feature matrix with class-indexed labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature column names, in table order
    pub feature_names: Vec<String>,
    /// `features[row][feature]`
    pub features: Vec<Vec<f64>>,
    /// Class index per row
    pub labels: Vec<usize>,
    /// Class names, sorted; `labels` index into this
    pub classes: Vec<String>,
}

impl Dataset {
    /// Build a dataset from a table
    ///
    /// Feature columns are `feature_columns` when given, otherwise every
    /// column except the identifier and the label. Labels are read as text,
    /// so any label type works; each distinct value becomes a class.
    pub fn from_table(
        table: &Table,
        id_column: &str,
        label_column: &str,
        feature_columns: Option<&[String]>,
    ) -> SelectionResult<Self> {
        let labels_col = table
            .column(label_column)
            .ok_or_else(|| SelectionError::MissingColumn(label_column.to_string()))?;

        let feature_names = match feature_columns {
            Some(names) => {
                for name in names {
                    if !table.schema().contains(name) {
                        return Err(SelectionError::MissingColumn(name.clone()));
                    }
                }
                names.to_vec()
            }
            None => candidate_features(table, id_column, label_column),
        };
        if feature_names.is_empty() {
            return Err(SelectionError::EmptyFeatureSet);
        }

        let texts = (0..table.num_rows())
            .map(|row| {
                labels_col
                    .text(row)
                    .map(|s| s.into_owned())
                    .ok_or_else(|| SelectionError::MissingLabel {
                        row_id: row_id(table, id_column, row),
                    })
            })
            .collect::<SelectionResult<Vec<_>>>()?;

        let classes: Vec<String> = texts
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let labels = texts
            .iter()
            .map(|t| classes.binary_search(t).unwrap_or_default())
            .collect();

        let features = feature_matrix(table, id_column, &feature_names)?;

        Ok(Self {
            feature_names,
            features,
            labels,
            classes,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Value of one feature in one row
    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.features[row][feature]
    }
}

/// Every column that is neither identifier nor label, in table order
pub(crate) fn candidate_features(table: &Table, id_column: &str, label_column: &str) -> Vec<String> {
    table
        .column_names()
        .into_iter()
        .filter(|name| *name != id_column && *name != label_column)
        .map(str::to_string)
        .collect()
}

/// Row-major numeric matrix of the named columns
///
/// Null, NaN and non-numeric cells are rejected with the row identifier.
pub(crate) fn feature_matrix(
    table: &Table,
    id_column: &str,
    names: &[String],
) -> SelectionResult<Vec<Vec<f64>>> {
    let mut rows = vec![Vec::with_capacity(names.len()); table.num_rows()];
    for name in names {
        let column = table.require_column(name)?;
        let values = column.to_f64().map_err(|row| SelectionError::NonNumericFeature {
            column: name.clone(),
            row_id: row_id(table, id_column, row),
        })?;
        for (row, value) in values.into_iter().enumerate() {
            let value = value
                .filter(|v| !v.is_nan())
                .ok_or_else(|| SelectionError::NonNumericFeature {
                    column: name.clone(),
                    row_id: row_id(table, id_column, row),
                })?;
            rows[row].push(value);
        }
    }
    Ok(rows)
}

/// Identifier of a row for error messages, `#<index>` when unavailable
pub(crate) fn row_id(table: &Table, id_column: &str, row: usize) -> String {
    table
        .text(row, id_column)
        .map(|s| s.into_owned())
        .unwrap_or_else(|| format!("#{}", row))
}
