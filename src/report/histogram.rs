//! Score distribution split by label, exported as data rather than an image.

use crate::error::{DetectError, Result};
use crate::scoring::Label;
use serde::{Deserialize, Serialize};

/// Shared fixed-width bins with one density series per label.
///
/// Density is `count / (group size * bin width)`, so each non-empty series
/// integrates to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistogram {
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub normal: Vec<f64>,
    pub anomaly: Vec<f64>,
    pub normal_count: usize,
    pub anomaly_count: usize,
}

impl ScoreHistogram {
    pub fn build(scores: &[f64], labels: &[Label], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(DetectError::invalid("histogram needs at least one bin"));
        }
        if scores.is_empty() {
            return Err(DetectError::invalid("histogram of no scores"));
        }
        if scores.len() != labels.len() {
            return Err(DetectError::Dimension {
                expected: scores.len(),
                actual: labels.len(),
            });
        }

        let (mut lo, mut hi) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut normal = vec![0usize; bins];
        let mut anomaly = vec![0usize; bins];
        for (&s, label) in scores.iter().zip(labels) {
            let bin = (((s - lo) / width) as usize).min(bins - 1);
            match label {
                Label::Normal => normal[bin] += 1,
                Label::Anomaly => anomaly[bin] += 1,
            }
        }

        let normal_count = normal.iter().sum();
        let anomaly_count = anomaly.iter().sum();
        Ok(Self {
            edges,
            normal: density(&normal, normal_count, width),
            anomaly: density(&anomaly, anomaly_count, width),
            normal_count,
            anomaly_count,
        })
    }

    pub fn bins(&self) -> usize {
        self.normal.len()
    }
}

fn density(counts: &[usize], total: usize, width: f64) -> Vec<f64> {
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|&c| c as f64 / (total as f64 * width))
        .collect()
}
