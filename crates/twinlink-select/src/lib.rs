//! twinlink-select - Importance-based feature selection
//!
//! Fits a random forest classifier on the engineered feature table and keeps
//! the features whose impurity-based importance reaches a threshold derived
//! from the importance distribution.
//!
//! ```text
//! table -> partition (80/20) -> forest on the fitting rows
//!       -> importances -> threshold -> support -> reduced tables
//! ```

mod dataset;
mod error;
mod forest;
mod partition;
mod selector;
mod threshold;
mod tree;

pub use dataset::Dataset;
pub use error::{SelectionError, SelectionResult};
pub use forest::{ForestConfig, RandomForest};
pub use partition::{train_test_split, Partition};
pub use selector::{FeatureScore, FeatureSelector, Selection, SelectionModel, SelectorConfig};
pub use threshold::{median, Threshold};
pub use tree::{DecisionTree, TreeConfig};
