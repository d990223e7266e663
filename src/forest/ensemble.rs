//! Ensemble of partition trees and the normalized anomaly score.

use super::{average_path_length, PartitionTree};
use crate::config::ForestConfig;
use crate::error::{DetectError, Result};
use crate::features::{ensure_finite, FeatureMatrixView};
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Score returned when the subsample is too small to isolate anything.
const NEUTRAL_SCORE: f64 = 0.5;

/// Trees fit over one matrix. Immutable after `fit`; safe to share across
/// scoring threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<PartitionTree>,
    subsample_size: usize,
    n_features: usize,
    parallel: bool,
}

impl IsolationForest {
    /// Draw `n_trees` subsamples (without replacement inside one subsample)
    /// and grow one tree per subsample.
    pub fn fit(matrix: FeatureMatrixView<'_>, config: &ForestConfig) -> Result<Self> {
        config.validate()?;
        ensure_finite(matrix)?;

        let subsample_size = config.subsample_size.resolve(matrix.nrows());
        let grow = |i: usize| grow_tree(matrix, subsample_size, tree_seed(config.seed, i));
        let trees = if config.parallel {
            (0..config.n_trees)
                .into_par_iter()
                .map(grow)
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..config.n_trees).map(grow).collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            trees,
            subsample_size,
            n_features: matrix.ncols(),
            parallel: config.parallel,
        })
    }

    pub fn trees(&self) -> &[PartitionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Effective `psi` used at fit time.
    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Path length of `record` in tree `tree`, `leaf_depth + c(leaf_size)`.
    pub fn path_length(&self, record: ArrayView1<'_, f64>, tree: usize) -> Result<f64> {
        self.check_width(record.len())?;
        let tree = self.trees.get(tree).ok_or_else(|| {
            DetectError::invalid(format!("tree {tree} out of range for {} trees", self.trees.len()))
        })?;
        Ok(tree.path_length(record))
    }

    /// Mean path length over all trees, `E(record)`.
    pub fn average_path(&self, record: ArrayView1<'_, f64>) -> Result<f64> {
        self.check_width(record.len())?;
        Ok(self.mean_path(record))
    }

    /// `2^(-E(record) / c(psi))`; in (0, 1], values near 1 are anomalous.
    pub fn anomaly_score(&self, record: ArrayView1<'_, f64>) -> Result<f64> {
        self.check_width(record.len())?;
        Ok(self.score_unchecked(record))
    }

    /// Scores for every record, in input order. All-or-nothing.
    pub fn score_batch(&self, matrix: FeatureMatrixView<'_>) -> Result<Vec<f64>> {
        self.check_width(matrix.ncols())?;
        ensure_finite(matrix)?;

        let scores: Vec<f64> = if self.parallel {
            (0..matrix.nrows())
                .into_par_iter()
                .map(|i| self.score_unchecked(matrix.row(i)))
                .collect()
        } else {
            matrix
                .outer_iter()
                .map(|row| self.score_unchecked(row))
                .collect()
        };
        Ok(scores)
    }

    fn mean_path(&self, record: ArrayView1<'_, f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(record)).sum();
        total / self.trees.len() as f64
    }

    fn score_unchecked(&self, record: ArrayView1<'_, f64>) -> f64 {
        let c = average_path_length(self.subsample_size);
        if c == 0.0 {
            return NEUTRAL_SCORE;
        }
        2.0_f64.powf(-self.mean_path(record) / c)
    }

    fn check_width(&self, actual: usize) -> Result<()> {
        if actual != self.n_features {
            return Err(DetectError::Dimension {
                expected: self.n_features,
                actual,
            });
        }
        Ok(())
    }
}

/// Independent, deterministic seed per tree.
fn tree_seed(base: u64, tree_index: usize) -> u64 {
    base.wrapping_add(tree_index as u64)
}

fn grow_tree(matrix: FeatureMatrixView<'_>, subsample_size: usize, seed: u64) -> Result<PartitionTree> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = index::sample(&mut rng, matrix.nrows(), subsample_size).into_vec();
    PartitionTree::build(matrix, &rows, &mut rng)
}
