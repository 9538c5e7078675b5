//! Random forest classifier

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{SelectionError, SelectionResult};
use crate::tree::{DecisionTree, TreeConfig};

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Candidate features per split (sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

/// Random forest classifier
///
/// Tree `i` draws its bootstrap sample and split candidates from a ChaCha8
/// stream seeded with `seed + i`, so a fit is reproducible regardless of
/// how rayon schedules the trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    seed: u64,
    trees: Vec<DecisionTree>,
    n_classes: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            trees: Vec::new(),
            n_classes: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Train the random forest
    pub fn fit(&mut self, dataset: &Dataset) -> SelectionResult<()> {
        let n_features = dataset.n_features();
        let n_samples = dataset.n_samples();
        if n_features == 0 {
            return Err(SelectionError::EmptyFeatureSet);
        }
        if n_samples == 0 {
            return Err(SelectionError::TooFewRows {
                rows: 0,
                required: 1,
            });
        }
        if self.config.n_trees == 0 {
            return Err(SelectionError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt() as usize).max(1));
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };
        let bootstrap = self.config.bootstrap;
        let seed = self.seed;

        // Build trees in parallel
        let trees: Vec<DecisionTree> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let rows: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new(tree_config.clone());
                tree.fit(dataset, &rows, &mut rng);
                tree
            })
            .collect();

        self.trees = trees;
        self.n_classes = dataset.n_classes();

        // Average over the trees that split at all
        self.feature_importances = vec![0.0; n_features];
        let mut splitting = 0;
        for tree in self.trees.iter().filter(|t| t.n_splits() > 0) {
            splitting += 1;
            for (i, &imp) in tree.feature_importances().iter().enumerate() {
                self.feature_importances[i] += imp;
            }
        }

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }

        debug!(
            trees = self.trees.len(),
            splitting_trees = splitting,
            max_features,
            "fitted random forest"
        );
        Ok(())
    }

    /// Majority vote over all trees; ties go to the lowest class index
    pub fn predict_one(&self, features: &[f64]) -> usize {
        let mut votes = vec![0usize; self.n_classes.max(1)];
        for tree in &self.trees {
            let class = tree.predict_one(features);
            if class < votes.len() {
                votes[class] += 1;
            }
        }
        votes
            .iter()
            .enumerate()
            .fold((0, 0), |best, (class, &count)| {
                if count > best.1 {
                    (class, count)
                } else {
                    best
                }
            })
            .0
    }

    /// Predict every row of a feature matrix
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<usize> {
        rows.par_iter().map(|f| self.predict_one(f)).collect()
    }

    /// Fraction of rows whose predicted class index equals `labels`
    pub fn accuracy(&self, dataset: &Dataset) -> f64 {
        if dataset.n_samples() == 0 {
            return 0.0;
        }
        let correct = self
            .predict(&dataset.features)
            .iter()
            .zip(&dataset.labels)
            .filter(|(p, l)| p == l)
            .count();
        correct as f64 / dataset.n_samples() as f64
    }

    /// Normalized impurity-based importances, one per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two informative features and one pure-noise feature
    fn dataset(n: usize) -> Dataset {
        let mut features = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let signal = class as f64 * 10.0 + (i % 5) as f64;
            let noise = ((i * 7919) % 13) as f64;
            features.push(vec![signal, noise, signal * 0.5 + 1.0]);
            labels.push(class);
        }
        Dataset {
            feature_names: vec!["signal".into(), "noise".into(), "echo".into()],
            features,
            labels,
            classes: vec!["0".into(), "1".into()],
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let ds = dataset(60);
        let mut forest = RandomForest::new(
            ForestConfig {
                n_trees: 20,
                max_features: Some(3),
                ..ForestConfig::default()
            },
            42,
        );
        forest.fit(&ds).unwrap();

        assert_eq!(forest.trees().len(), 20);
        assert_eq!(forest.accuracy(&ds), 1.0);
        assert_eq!(forest.predict_one(&[0.0, 3.0, 1.0]), 0);
        assert_eq!(forest.predict_one(&[12.0, 3.0, 7.0]), 1);
    }

    #[test]
    fn test_importances_normalized_and_informative() {
        let ds = dataset(80);
        let mut forest = RandomForest::new(ForestConfig::default(), 7);
        forest.fit(&ds).unwrap();

        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 3);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp.iter().all(|&x| x >= 0.0));
        assert!(imp[0] + imp[2] > imp[1]);
    }

    #[test]
    fn test_same_seed_same_importances() {
        let ds = dataset(40);
        let mut a = RandomForest::new(ForestConfig::default(), 3);
        let mut b = RandomForest::new(ForestConfig::default(), 3);
        a.fit(&ds).unwrap();
        b.fit(&ds).unwrap();
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_no_split_gives_zero_importances() {
        let ds = Dataset {
            feature_names: vec!["flat".into()],
            features: vec![vec![1.0]; 6],
            labels: vec![0, 1, 0, 1, 0, 1],
            classes: vec!["a".into(), "b".into()],
        };
        let mut forest = RandomForest::new(ForestConfig::default(), 0);
        forest.fit(&ds).unwrap();
        assert_eq!(forest.feature_importances(), &[0.0]);
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let empty = Dataset {
            feature_names: Vec::new(),
            features: vec![Vec::new(); 3],
            labels: vec![0, 1, 0],
            classes: vec!["a".into(), "b".into()],
        };
        let mut forest = RandomForest::new(ForestConfig::default(), 0);
        assert!(matches!(forest.fit(&empty), Err(SelectionError::EmptyFeatureSet)));

        let mut no_trees = RandomForest::new(
            ForestConfig {
                n_trees: 0,
                ..ForestConfig::default()
            },
            0,
        );
        assert!(no_trees.fit(&dataset(10)).is_err());
    }
}
