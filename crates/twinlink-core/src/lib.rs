//! twinlink-core - Paired-record feature pipeline
//!
//! Ties the stages together behind one configuration:
//!
//! - **clean**: de-duplicate, filter and standardize raw paired records
//! - **features**: replace twin attributes with similarity features
//! - **select**: keep the features a random forest finds important
//!
//! Each stage maps a `Table` to a new `Table`; [`Pipeline::run`] chains them
//! and persists every intermediate result.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{ConfigError, IoConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunOutputs};

pub use twinlink_features::{EngineConfig, FeatureEngine};
pub use twinlink_io::{Table, TwinConvention};
pub use twinlink_prep::{CleanConfig, CleanReport, Cleaner};
pub use twinlink_select::{
    FeatureSelector, ForestConfig, Selection, SelectionError, SelectionModel, SelectorConfig,
    Threshold,
};
