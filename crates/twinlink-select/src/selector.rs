//! Importance-based feature selector
//!
//! `FeatureSelector::select` partitions the table, fits a random forest on
//! the fitting rows, thresholds the importances and reduces both partitions
//! to the same support. The fitted [`SelectionModel`] carries the support and
//! can reduce any further table with the same columns.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use twinlink_io::Table;

use crate::dataset::{feature_matrix, Dataset};
use crate::error::{SelectionError, SelectionResult};
use crate::forest::{ForestConfig, RandomForest};
use crate::partition::train_test_split;
use crate::threshold::Threshold;

/// Slack on the support comparison so features sitting exactly on a mean or
/// median threshold are not lost to rounding
const SUPPORT_TOLERANCE: f64 = 1e-12;

/// Selector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Identifier column, excluded from the candidate features (not serialized)
    #[serde(skip)]
    pub id_column: String,
    /// Classification target
    pub label_column: String,
    /// Explicit feature columns; each must exist in the table
    pub feature_columns: Option<Vec<String>>,
    /// Features used when `feature_columns` is unset, skipping absent ones;
    /// empty means every non-id, non-label column (not serialized)
    #[serde(skip)]
    pub candidate_columns: Vec<String>,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the partition and the forest
    pub seed: u64,
    /// Selection threshold rule
    pub threshold: Threshold,
    /// Keep the identifier column in reduced tables
    pub include_id: bool,
    /// Forest hyperparameters
    pub forest: ForestConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            label_column: "label".to_string(),
            feature_columns: None,
            candidate_columns: Vec::new(),
            test_fraction: 0.2,
            seed: 42,
            threshold: Threshold::Mean,
            include_id: true,
            forest: ForestConfig::default(),
        }
    }
}

/// Importance of one candidate feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub name: String,
    pub importance: f64,
    pub selected: bool,
}

/// A fitted selection: importances, threshold and support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionModel {
    id_column: String,
    label_column: String,
    include_id: bool,
    threshold_rule: Threshold,
    threshold: f64,
    features: Vec<FeatureScore>,
    classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    held_out_accuracy: Option<f64>,
}

/// Result of [`FeatureSelector::select`]
#[derive(Debug, Clone)]
pub struct Selection {
    pub model: SelectionModel,
    /// Reduced fitting partition
    pub train: Table,
    /// Reduced evaluation partition
    pub test: Table,
}

/// Fits selection models
#[derive(Debug, Clone, Default)]
pub struct FeatureSelector {
    config: SelectorConfig,
}

impl FeatureSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Partition `table`, fit on the fitting rows and reduce both partitions
    pub fn select(&self, table: &Table) -> SelectionResult<Selection> {
        self.check_columns(table)?;

        let partition =
            train_test_split(table.num_rows(), self.config.test_fraction, self.config.seed)?;
        let train = table.take_rows(&partition.train);
        let test = table.take_rows(&partition.test);
        debug!(
            train_rows = train.num_rows(),
            test_rows = test.num_rows(),
            seed = self.config.seed,
            "partitioned rows"
        );

        let (mut model, forest) = self.fit_forest(&train)?;

        let accuracy = self.held_out_accuracy(&forest, &model, &test)?;
        debug!(accuracy, "held-out accuracy");
        model.held_out_accuracy = Some(accuracy);

        let train = model.transform(&train)?;
        let test = model.transform(&test)?;
        Ok(Selection { model, train, test })
    }

    /// Fit a selection on every row of `table`, without holding any out
    pub fn fit(&self, table: &Table) -> SelectionResult<SelectionModel> {
        self.check_columns(table)?;
        self.fit_forest(table).map(|(model, _)| model)
    }

    fn check_columns(&self, table: &Table) -> SelectionResult<()> {
        let id = self.config.id_column.as_str();
        let label = self.config.label_column.as_str();
        if !table.schema().contains(label) {
            return Err(SelectionError::MissingColumn(label.to_string()));
        }
        if id == label {
            warn!(
                column = label,
                "label column is the identifier column; an identifier is being used as the classification target"
            );
        }
        Ok(())
    }

    /// Explicit columns, else the candidates present in `table`
    fn feature_columns(&self, table: &Table) -> Option<Vec<String>> {
        if let Some(names) = &self.config.feature_columns {
            return Some(names.clone());
        }
        if self.config.candidate_columns.is_empty() {
            return None;
        }
        let present: Vec<String> = self
            .config
            .candidate_columns
            .iter()
            .filter(|name| table.schema().contains(name))
            .cloned()
            .collect();
        debug!(candidates = ?present, "candidate feature columns");
        Some(present)
    }

    fn fit_forest(&self, table: &Table) -> SelectionResult<(SelectionModel, RandomForest)> {
        let feature_columns = self.feature_columns(table);
        let dataset = Dataset::from_table(
            table,
            &self.config.id_column,
            &self.config.label_column,
            feature_columns.as_deref(),
        )?;
        if dataset.n_classes() < 2 {
            let class = dataset.classes.first().cloned().unwrap_or_default();
            return Err(SelectionError::ConstantLabel(class));
        }

        let mut forest = RandomForest::new(self.config.forest.clone(), self.config.seed);
        forest.fit(&dataset)?;

        let importances = forest.feature_importances().to_vec();
        if importances.iter().all(|&x| x == 0.0) {
            return Err(SelectionError::DegenerateImportances);
        }

        let threshold = self.config.threshold.resolve(&importances);
        let features: Vec<FeatureScore> = dataset
            .feature_names
            .iter()
            .zip(&importances)
            .map(|(name, &importance)| FeatureScore {
                name: name.clone(),
                importance,
                selected: importance >= threshold - SUPPORT_TOLERANCE,
            })
            .collect();

        for score in &features {
            debug!(
                feature = %score.name,
                importance = score.importance,
                selected = score.selected,
                "feature importance"
            );
        }

        if !features.iter().any(|f| f.selected) {
            let max_importance = importances.iter().copied().fold(0.0, f64::max);
            return Err(SelectionError::EmptySelection {
                threshold,
                max_importance,
            });
        }

        let model = SelectionModel {
            id_column: self.config.id_column.clone(),
            label_column: self.config.label_column.clone(),
            include_id: self.config.include_id,
            threshold_rule: self.config.threshold,
            threshold,
            features,
            classes: dataset.classes,
            held_out_accuracy: None,
        };
        info!(
            candidates = model.features.len(),
            selected = model.selected_features().len(),
            threshold,
            rule = %model.threshold_rule,
            "selected features"
        );
        Ok((model, forest))
    }

    /// Share of held-out rows whose predicted class matches their label
    fn held_out_accuracy(
        &self,
        forest: &RandomForest,
        model: &SelectionModel,
        test: &Table,
    ) -> SelectionResult<f64> {
        let names: Vec<String> = model.features.iter().map(|f| f.name.clone()).collect();
        let rows = feature_matrix(test, &self.config.id_column, &names)?;
        let label = test.require_column(&self.config.label_column)?;

        let predictions = forest.predict(&rows);
        let correct = predictions
            .iter()
            .enumerate()
            .filter(|(row, &class)| {
                label.text(*row).as_deref() == model.classes.get(class).map(String::as_str)
            })
            .count();
        Ok(correct as f64 / rows.len().max(1) as f64)
    }
}

impl SelectionModel {
    /// Candidate feature names, in table order
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Importance per candidate feature, in table order (sums to 1)
    pub fn importances(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.importance).collect()
    }

    /// Candidate features sorted by importance, highest first
    ///
    /// Equal importances keep table order.
    pub fn ranking(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .features
            .iter()
            .map(|f| (f.name.as_str(), f.importance))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }

    /// Selected feature names, in table order
    pub fn selected_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.selected)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Support mask over the candidate features
    pub fn support(&self) -> Vec<bool> {
        self.features.iter().map(|f| f.selected).collect()
    }

    /// Resolved threshold value
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rule the threshold was derived with
    pub fn threshold_rule(&self) -> Threshold {
        self.threshold_rule
    }

    /// Label classes seen while fitting
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Accuracy on the evaluation partition, when one was held out
    pub fn held_out_accuracy(&self) -> Option<f64> {
        self.held_out_accuracy
    }

    pub fn scores(&self) -> &[FeatureScore] {
        &self.features
    }

    /// Reduce a table to identifier, selected features and label
    ///
    /// The identifier is kept when configured and present; the label when
    /// present. When they are the same column it appears once.
    pub fn transform(&self, table: &Table) -> SelectionResult<Table> {
        let mut columns: Vec<&str> = Vec::new();
        if self.include_id && table.schema().contains(&self.id_column) {
            columns.push(&self.id_column);
        }
        for name in self.selected_features() {
            if !table.schema().contains(name) {
                return Err(SelectionError::MissingColumn(name.to_string()));
            }
            columns.push(name);
        }
        if table.schema().contains(&self.label_column)
            && !columns.contains(&self.label_column.as_str())
        {
            columns.push(&self.label_column);
        }
        Ok(table.select_columns(&columns)?)
    }

    /// Importance report as pretty-printed JSON
    pub fn to_json(&self) -> SelectionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SelectionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
