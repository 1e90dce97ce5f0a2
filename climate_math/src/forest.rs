//! Random forest regression over a single predictor
//!
//! Each tree is a fully grown CART regression tree fitted to a bootstrap
//! sample; the forest prediction is the mean over trees. Sampling uses a
//! seeded generator so repeated fits on the same data agree exactly.

use crate::{MathError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random forest hyper-parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Seed for bootstrap sampling
    pub seed: u64,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Optional cap on tree depth
    pub max_depth: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: f64) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                threshold,
                left,
                right,
            } => {
                if x <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<Node>,
}

impl RandomForestRegressor {
    /// Fit the forest on `(x, y)` pairs
    pub fn fit(x: &[f64], y: &[f64], config: &ForestConfig) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x and y must have the same length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(MathError::InsufficientData(
                "Random forest needs at least one sample".to_string(),
            ));
        }
        if config.n_trees == 0 {
            return Err(MathError::InvalidInput(
                "Random forest needs at least one tree".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Random forest input must be finite".to_string(),
            ));
        }

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);

        for _ in 0..config.n_trees {
            let mut sample: Vec<(f64, f64)> = (0..n)
                .map(|_| {
                    let i = rng.gen_range(0..n);
                    (x[i], y[i])
                })
                .collect();
            sample.sort_by(|a, b| a.0.total_cmp(&b.0));
            trees.push(build_tree(&sample, 0, config));
        }

        Ok(Self { trees })
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean prediction across all trees
    pub fn predict(&self, x: f64) -> f64 {
        self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64
    }
}

/// Grow a tree on samples sorted by predictor
fn build_tree(samples: &[(f64, f64)], depth: usize, config: &ForestConfig) -> Node {
    let n = samples.len();
    let mean = samples.iter().map(|s| s.1).sum::<f64>() / n as f64;

    let depth_exhausted = config.max_depth.map_or(false, |max| depth >= max);
    if n < config.min_samples_split.max(2) || depth_exhausted {
        return Node::Leaf(mean);
    }

    match best_split(samples) {
        Some(split_at) => {
            let threshold = (samples[split_at - 1].0 + samples[split_at].0) / 2.0;
            Node::Split {
                threshold,
                left: Box::new(build_tree(&samples[..split_at], depth + 1, config)),
                right: Box::new(build_tree(&samples[split_at..], depth + 1, config)),
            }
        }
        None => Node::Leaf(mean),
    }
}

/// Index splitting `samples` into `[..i]` and `[i..]` with the lowest squared error.
///
/// Only boundaries between distinct predictor values are candidates. Returns
/// `None` when no split reduces the error.
fn best_split(samples: &[(f64, f64)]) -> Option<usize> {
    let n = samples.len();
    let total_sum: f64 = samples.iter().map(|s| s.1).sum();
    let total_sq: f64 = samples.iter().map(|s| s.1 * s.1).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut left_sum = 0.0;
    let mut left_sq = 0.0;
    let mut best: Option<(usize, f64)> = None;

    for i in 1..n {
        let y = samples[i - 1].1;
        left_sum += y;
        left_sq += y * y;

        if samples[i - 1].0 == samples[i].0 {
            continue;
        }

        let nl = i as f64;
        let nr = (n - i) as f64;
        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

        if best.map_or(true, |(_, b)| sse < b) {
            best = Some((i, sse));
        }
    }

    best.filter(|&(_, sse)| sse < parent_sse - 1e-12)
        .map(|(i, _)| i)
}
