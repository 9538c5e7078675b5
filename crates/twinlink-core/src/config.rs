//! Configuration for twinlink-core
//!
//! One file configures every stage. Sections mirror the stages (`io`,
//! `clean`, `engine`, `selection`); every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! [io]
//! delimiter = ","
//! id_column = "id"
//!
//! [engine]
//! convention = "underscore"
//!
//! [selection]
//! label_column = "is_match"
//! threshold = "1.25*mean"
//!
//! [selection.forest]
//! n_trees = 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use twinlink_features::{EngineConfig, FeatureEngine};
use twinlink_io::CsvOptions;
use twinlink_prep::{is_valid_date_format, CleanConfig};
use twinlink_select::SelectorConfig;

/// Pipeline-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Table I/O settings
    pub io: IoConfig,
    /// Cleaning rules
    pub clean: CleanConfig,
    /// Similarity engine settings
    pub engine: EngineConfig,
    /// Feature selection settings
    pub selection: SelectorConfig,
}

/// Table I/O configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Field delimiter for reading and writing
    pub delimiter: char,
    /// Identifier column shared by every stage
    pub id_column: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            id_column: "id".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load and validate a configuration file
    ///
    /// `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&text).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            Self::from_toml(&text).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.io.delimiter.is_ascii() || matches!(self.io.delimiter, '"' | '\n' | '\r') {
            return Err(ConfigError::OutOfRange(format!(
                "delimiter must be a single ASCII character other than a quote or newline, got {:?}",
                self.io.delimiter
            )));
        }

        if self.io.id_column.trim().is_empty() {
            return Err(ConfigError::MissingField("io.id_column".to_string()));
        }
        if self.selection.label_column.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "selection.label_column".to_string(),
            ));
        }
        if self.clean.date_format.is_empty() {
            return Err(ConfigError::MissingField("clean.date_format".to_string()));
        }
        if !is_valid_date_format(&self.clean.date_format) {
            return Err(ConfigError::OutOfRange(format!(
                "clean.date_format {:?} must render dates that parse back to the same day",
                self.clean.date_format
            )));
        }

        // Held-out share must leave rows on both sides
        let fraction = self.selection.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::OutOfRange(
                "selection.test_fraction must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        let forest = &self.selection.forest;
        if forest.n_trees == 0 {
            return Err(ConfigError::OutOfRange(
                "selection.forest.n_trees must be positive".to_string(),
            ));
        }
        if forest.min_samples_split < 2 {
            return Err(ConfigError::OutOfRange(
                "selection.forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        if forest.min_samples_leaf == 0 {
            return Err(ConfigError::OutOfRange(
                "selection.forest.min_samples_leaf must be positive".to_string(),
            ));
        }
        if forest.max_features == Some(0) {
            return Err(ConfigError::OutOfRange(
                "selection.forest.max_features must be positive".to_string(),
            ));
        }
        if forest.max_depth == Some(0) {
            return Err(ConfigError::OutOfRange(
                "selection.forest.max_depth must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// CSV options for every table read and written
    ///
    /// Cells are read as text so identifiers keep their leading zeros.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.io.delimiter as u8,
            ..CsvOptions::default()
        }
    }

    /// Cleaning configuration with the shared identifier and convention
    pub fn clean_config(&self) -> CleanConfig {
        CleanConfig {
            id_column: self.io.id_column.clone(),
            convention: self.engine.convention,
            ..self.clean.clone()
        }
    }

    /// Engine configuration with the shared identifier and the cleaner's
    /// date layout
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            id_column: self.io.id_column.clone(),
            date_format: Some(self.clean.date_format.clone()),
            ..self.engine.clone()
        }
    }

    /// Selector configuration with the shared identifier
    ///
    /// Unless `selection.feature_columns` is set, the candidates are the
    /// engine's similarity features, so passthrough columns are never fitted.
    pub fn selector_config(&self) -> SelectorConfig {
        let candidate_columns = FeatureEngine::new(self.engine_config())
            .features()
            .iter()
            .map(|spec| spec.name.to_string())
            .collect();
        SelectorConfig {
            id_column: self.io.id_column.clone(),
            candidate_columns,
            ..self.selection.clone()
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Value is out of valid range
    OutOfRange(String),
    /// Required field is missing or empty
    MissingField(String),
    /// The file could not be read
    Unreadable(String),
    /// The file is not valid TOML/JSON for this schema
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
            ConfigError::MissingField(msg) => write!(f, "Missing field: {}", msg),
            ConfigError::Unreadable(msg) => write!(f, "Cannot read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Cannot parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
