//! Stage orchestration
//!
//! Every stage is `&Table -> Table`; the file-level helpers read and write
//! tables with the configured delimiter.

use std::path::{Path, PathBuf};
use tracing::info;

use twinlink_features::FeatureEngine;
use twinlink_io::{open_file, CsvWriter, Table};
use twinlink_prep::{CleanReport, Cleaner};
use twinlink_select::{FeatureSelector, Selection, SelectionModel};

use crate::config::PipelineConfig;
use crate::error::Result;

pub const CLEANED_FILE: &str = "cleaned.csv";
pub const FEATURES_FILE: &str = "features.csv";
pub const SELECTED_FILE: &str = "selected.csv";
pub const IMPORTANCES_FILE: &str = "importances.json";

/// What a full run produced
#[derive(Debug, Clone)]
pub struct RunOutputs {
    pub clean_report: CleanReport,
    pub model: SelectionModel,
    pub cleaned: PathBuf,
    pub features: PathBuf,
    pub selected: PathBuf,
    pub importances: PathBuf,
}

/// Configured clean → features → select pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    cleaner: Cleaner,
    engine: FeatureEngine,
    selector: FeatureSelector,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cleaner: Cleaner::new(config.clean_config()),
            engine: FeatureEngine::new(config.engine_config()),
            selector: FeatureSelector::new(config.selector_config()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read a delimited table; every cell is kept as text
    pub fn read_table(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let reader = open_file(&path.to_string_lossy(), self.config.csv_options())?;
        let table = reader.read_table()?;
        info!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "read table"
        );
        Ok(table)
    }

    /// Write a table with the configured delimiter
    pub fn write_table(&self, table: &Table, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        CsvWriter::new(self.config.io.delimiter as u8).write_path(table, path)?;
        info!(path = %path.display(), rows = table.num_rows(), "wrote table");
        Ok(())
    }

    /// De-duplicate, filter and standardize raw paired records
    pub fn clean(&self, raw: &Table) -> Result<(Table, CleanReport)> {
        Ok(self.cleaner.clean(raw)?)
    }

    /// Replace twin attributes with similarity features
    pub fn features(&self, cleaned: &Table) -> Result<Table> {
        Ok(self.engine.derive(cleaned)?)
    }

    /// Fit the selector and reduce both partitions
    pub fn select(&self, features: &Table) -> Result<Selection> {
        Ok(self.selector.select(features)?)
    }

    /// Run every stage on `input`, writing each result into `out_dir`
    pub fn run(&self, input: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<RunOutputs> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)?;

        let raw = self.read_table(input)?;

        let (cleaned, clean_report) = self.clean(&raw)?;
        let cleaned_path = out_dir.join(CLEANED_FILE);
        self.write_table(&cleaned, &cleaned_path)?;

        let features = self.features(&cleaned)?;
        let features_path = out_dir.join(FEATURES_FILE);
        self.write_table(&features, &features_path)?;

        let selection = self.select(&features)?;
        let selected_path = out_dir.join(SELECTED_FILE);
        self.write_table(&selection.train, &selected_path)?;

        let importances_path = out_dir.join(IMPORTANCES_FILE);
        std::fs::write(&importances_path, selection.model.to_json()?)?;

        info!(
            out_dir = %out_dir.display(),
            selected = ?selection.model.selected_features(),
            "pipeline finished"
        );

        Ok(RunOutputs {
            clean_report,
            model: selection.model,
            cleaned: cleaned_path,
            features: features_path,
            selected: selected_path,
            importances: importances_path,
        })
    }
}
