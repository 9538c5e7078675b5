//! Similarity feature engine
//!
//! Replaces every twin attribute pair of a cleaned paired-record table with a
//! single scalar feature. The input table is never modified; `derive` builds
//! a new table holding the identifier, the features in catalogue order, and
//! every column the features did not consume.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use twinlink_io::{ColumnType, DataColumn, Table, TwinConvention};

use crate::error::{EngineError, EngineResult};
use crate::feature::{standard_features, FeatureSpec, FeatureValue};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identifier column carried through unchanged (not serialized)
    #[serde(skip)]
    pub id_column: String,
    /// Twin suffix convention; detected from the table when unset
    pub convention: Option<TwinConvention>,
    /// Clamp `dob_sim` to `[0, 100]`
    pub clamp_dob_sim: bool,
    /// Derive `name_sim` when `name` twins are present
    pub include_name_sim: bool,
    /// Layout of standardized dates, tried before the built-in layouts
    /// (not serialized)
    #[serde(skip)]
    pub date_format: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            convention: None,
            clamp_dob_sim: true,
            include_name_sim: true,
            date_format: None,
        }
    }
}

/// Derives pairwise similarity features from a paired-record table
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    config: EngineConfig,
    features: Vec<FeatureSpec>,
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FeatureEngine {
    /// Create an engine with the standard feature set
    pub fn new(config: EngineConfig) -> Self {
        let features = standard_features(config.clamp_dob_sim, config.include_name_sim);
        Self { config, features }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Features this engine derives, in output order
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Derive the feature table
    pub fn derive(&self, table: &Table) -> EngineResult<Table> {
        let id_column = self.config.id_column.as_str();
        let ids = table
            .column(id_column)
            .ok_or_else(|| EngineError::MissingIdColumn(id_column.to_string()))?;

        let convention = match self.config.convention {
            Some(convention) => convention,
            None => TwinConvention::detect(table.schema()).ok_or(EngineError::NoTwinColumns)?,
        };
        debug!(%convention, "resolved twin convention");

        let mut output = Table::new().with_column(id_column, ids.clone())?;
        let mut consumed: HashSet<String> = HashSet::new();

        for spec in &self.features {
            let Some((left, right)) = resolve_twins(table, spec, convention) else {
                if spec.required {
                    return Err(EngineError::MissingColumn {
                        feature: spec.name.to_string(),
                        attributes: spec.attributes.iter().map(|a| a.to_string()).collect(),
                    });
                }
                debug!(feature = spec.name, "twin columns absent, skipping optional feature");
                continue;
            };

            let date_format = self.config.date_format.as_deref();
            let twins = (left.as_str(), right.as_str());
            let column = evaluate_feature(table, ids, spec, twins, date_format)?;
            output = output.with_column(spec.name, column)?;
            consumed.insert(left);
            consumed.insert(right);
        }

        let feature_count = output.num_columns() - 1;
        let mut passthrough = 0;
        for (descriptor, data) in table.columns() {
            let name = descriptor.name.as_str();
            if name == id_column || consumed.contains(name) {
                continue;
            }
            if output.schema().contains(name) {
                warn!(column = name, "input column shadowed by a derived feature, dropping it");
                continue;
            }
            output = output.with_column(name, data.clone())?;
            passthrough += 1;
        }

        info!(
            rows = output.num_rows(),
            features = feature_count,
            passthrough,
            "derived similarity features"
        );
        Ok(output)
    }
}

/// Find both twin columns for the first accepted attribute name present
fn resolve_twins(
    table: &Table,
    spec: &FeatureSpec,
    convention: TwinConvention,
) -> Option<(String, String)> {
    spec.attributes
        .iter()
        .map(|base| convention.twin_names(base))
        .find(|(left, right)| table.schema().contains(left) && table.schema().contains(right))
}

/// Evaluate one feature over every row, in parallel
///
/// On failure the error for the lowest offending row is returned.
fn evaluate_feature(
    table: &Table,
    ids: &DataColumn,
    spec: &FeatureSpec,
    (left_name, right_name): (&str, &str),
    date_format: Option<&str>,
) -> EngineResult<DataColumn> {
    let left = table.require_column(left_name)?;
    let right = table.require_column(right_name)?;

    let row_id = |row: usize| {
        ids.text(row)
            .map(|s| s.into_owned())
            .unwrap_or_else(|| format!("#{}", row))
    };

    let results: Vec<EngineResult<FeatureValue>> = (0..table.num_rows())
        .into_par_iter()
        .map(|row| {
            let l = left.text(row).ok_or_else(|| EngineError::MissingValue {
                row_id: row_id(row),
                column: left_name.to_string(),
            })?;
            let r = right.text(row).ok_or_else(|| EngineError::MissingValue {
                row_id: row_id(row),
                column: right_name.to_string(),
            })?;

            spec.metric
                .evaluate(&l, &r, date_format)
                .map_err(|reason| EngineError::InvalidValue {
                    row_id: row_id(row),
                    column: format!("{}/{}", left_name, right_name),
                    value: format!("{} | {}", l, r),
                    reason,
                })
        })
        .collect();

    let values = results.into_iter().collect::<EngineResult<Vec<_>>>()?;
    Ok(into_column(values, spec.metric.output_type()))
}

/// Pack feature values into a column of the metric's output type
fn into_column(values: Vec<FeatureValue>, dtype: ColumnType) -> DataColumn {
    if dtype == ColumnType::Int64 {
        DataColumn::Int64(
            values
                .into_iter()
                .map(|v| match v {
                    FeatureValue::Int(x) => Some(x),
                    FeatureValue::Float(x) => Some(x as i64),
                })
                .collect(),
        )
    } else {
        DataColumn::Float64(
            values
                .into_iter()
                .map(|v| match v {
                    FeatureValue::Int(x) => Some(x as f64),
                    FeatureValue::Float(x) => Some(x),
                })
                .collect(),
        )
    }
}
