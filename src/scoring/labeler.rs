//! Contamination-driven threshold and ANOMALY / NORMAL labels.

use crate::config::{validate_contamination, ScoringConfig};
use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomaly,
}

impl Label {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold {
            Label::Anomaly
        } else {
            Label::Normal
        }
    }

    pub fn is_anomaly(self) -> bool {
        self == Label::Anomaly
    }
}

/// Score at the `(1 - contamination)` quantile, interpolated linearly between
/// order statistics. Records scoring at or above it are anomalies.
pub fn threshold_for_contamination(scores: &[f64], contamination: f64) -> Result<f64> {
    validate_contamination(contamination)?;
    if scores.is_empty() {
        return Err(DetectError::invalid("cannot derive a threshold from no scores"));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(DetectError::invalid("score vector contains NaN"));
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (1.0 - contamination) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

pub fn label(scores: &[f64], threshold: f64) -> Vec<Label> {
    scores
        .iter()
        .map(|&s| Label::from_score(s, threshold))
        .collect()
}

/// Ascending positions labeled `Anomaly`.
pub fn anomaly_indices(labels: &[Label]) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter_map(|(i, l)| l.is_anomaly().then_some(i))
        .collect()
}

/// Outcome of one detection run, index-aligned to the input records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub scores: Vec<f64>,
    pub labels: Vec<Label>,
    pub threshold: f64,
}

impl Detection {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn anomaly_indices(&self) -> Vec<usize> {
        anomaly_indices(&self.labels)
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }

    pub fn anomaly_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.anomaly_count() as f64 / self.len() as f64
    }
}

pub struct Labeler {
    config: ScoringConfig,
}

impl Labeler {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn label_batch(&self, scores: Vec<f64>) -> Result<Detection> {
        let threshold = threshold_for_contamination(&scores, self.config.contamination)?;
        let labels = label(&scores, threshold);
        Ok(Detection {
            scores,
            labels,
            threshold,
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}
