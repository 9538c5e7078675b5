//! CART classification tree with Gini impurity

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Decision tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// Decision tree classifier
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    n_classes: usize,
    root: Option<Node>,
    feature_importances: Vec<f64>,
    n_splits: usize,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            n_classes: 0,
            root: None,
            feature_importances: Vec::new(),
            n_splits: 0,
        }
    }

    /// Grow the tree on the given rows of `dataset`
    ///
    /// `rows` may repeat indices (bootstrap samples). `rng` drives the
    /// choice of candidate features at each split.
    pub fn fit(&mut self, dataset: &Dataset, rows: &[usize], rng: &mut ChaCha8Rng) {
        self.n_classes = dataset.n_classes();
        self.feature_importances = vec![0.0; dataset.n_features()];
        self.n_splits = 0;

        let root = self.build_tree(dataset, rows.to_vec(), 0, rng);
        self.root = Some(root);

        // Normalize feature importances
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    fn build_tree(
        &mut self,
        dataset: &Dataset,
        rows: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let counts = class_counts(dataset, &rows, self.n_classes);
        let n = rows.len();
        let impurity = gini(&counts, n);

        if self.config.max_depth.is_some_and(|max| depth >= max)
            || n < self.config.min_samples_split.max(2)
            || impurity < 1e-12
        {
            return leaf(&counts);
        }

        let Some(split) = self.find_best_split(dataset, &rows, &counts, impurity, rng) else {
            return leaf(&counts);
        };

        self.feature_importances[split.feature] += split.decrease;
        self.n_splits += 1;

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| dataset.value(row, split.feature) <= split.threshold);

        let left = self.build_tree(dataset, left_rows, depth + 1, rng);
        let right = self.build_tree(dataset, right_rows, depth + 1, rng);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Best threshold over a random subset of features
    ///
    /// Candidate thresholds are midpoints between consecutive distinct
    /// values; a split must leave `min_samples_leaf` rows on each side and
    /// strictly reduce the weighted impurity.
    fn find_best_split(
        &self,
        dataset: &Dataset,
        rows: &[usize],
        counts: &[usize],
        impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = dataset.n_features();
        if n_features == 0 {
            return None;
        }
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);

        let n = rows.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent = n as f64 * impurity;
        let mut best: Option<BestSplit> = None;

        for &feature in &candidates {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| {
                dataset
                    .value(a, feature)
                    .total_cmp(&dataset.value(b, feature))
            });

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();

            for pos in 1..n {
                let moved = dataset.labels[sorted[pos - 1]];
                left[moved] += 1;
                right[moved] -= 1;

                let lo = dataset.value(sorted[pos - 1], feature);
                let hi = dataset.value(sorted[pos], feature);
                if lo >= hi || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let decrease = parent
                    - pos as f64 * gini(&left, pos)
                    - (n - pos) as f64 * gini(&right, n - pos);
                if decrease <= best.as_ref().map_or(0.0, |b| b.decrease) {
                    continue;
                }

                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    decrease,
                });
            }
        }

        best
    }

    /// Predict the class index of one sample
    pub fn predict_one(&self, features: &[f64]) -> usize {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0,
        };
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Normalized impurity decrease per feature (all zero when unsplit)
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Number of internal nodes
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }
}

fn class_counts(dataset: &Dataset, rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &row in rows {
        counts[dataset.labels[row]] += 1;
    }
    counts
}

/// Gini impurity `1 - sum(p_k^2)`
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Majority class; ties go to the lowest class index
fn leaf(counts: &[usize]) -> Node {
    let class = counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (class, &count)| {
            if count > best.1 {
                (class, count)
            } else {
                best
            }
        })
        .0;
    Node::Leaf { class }
}
