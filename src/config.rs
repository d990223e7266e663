//! Detector configuration. Passed at construction; the binary reads it from JSON.

use crate::error::{DetectError, Result};
use crate::features::FLOW_FEATURES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Subsample size used when `SubsampleSize::Auto` is configured.
pub const AUTO_SUBSAMPLE_CAP: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Ordered feature schema resolved against the source columns
    pub features: FeaturesConfig,
    /// Ensemble construction parameters
    pub forest: ForestConfig,
    /// Contamination-driven labeling
    pub scoring: ScoringConfig,
    /// Input dataset and output locations (binary only)
    pub data: DataConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of partition trees in the ensemble
    pub n_trees: usize,
    /// Records drawn per tree
    pub subsample_size: SubsampleSize,
    /// Base seed; tree `i` draws from `seed + i`
    pub seed: u64,
    /// Build trees and score records on the rayon pool
    pub parallel: bool,
}

/// Per-tree subsample size: `"auto"` or `{"fixed": n}` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsampleSize {
    /// min(256, dataset size)
    Auto,
    /// min(n, dataset size)
    Fixed(usize),
}

impl SubsampleSize {
    /// Effective subsample size for a dataset of `n_rows` records.
    pub fn resolve(self, n_rows: usize) -> usize {
        match self {
            SubsampleSize::Auto => AUTO_SUBSAMPLE_CAP.min(n_rows),
            SubsampleSize::Fixed(n) => n.min(n_rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Expected fraction of anomalous flows, in (0, 1)
    pub contamination: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Bin count of the exported score histogram
    pub histogram_bins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            features: FeaturesConfig::default(),
            forest: ForestConfig::default(),
            scoring: ScoringConfig::default(),
            data: DataConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            columns: FLOW_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            subsample_size: SubsampleSize::Auto,
            seed: 42,
            parallel: true,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            contamination: 0.02,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data").join("CICDDoS2019_PortMap.csv"),
            output_dir: PathBuf::from("output"),
            histogram_bins: 50,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(DetectError::invalid("n_trees must be positive"));
        }
        if self.subsample_size == SubsampleSize::Fixed(0) {
            return Err(DetectError::invalid("subsample_size must be positive"));
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        validate_contamination(self.contamination)
    }
}

pub(crate) fn validate_contamination(contamination: f64) -> Result<()> {
    // Written so that NaN fails too.
    if !(contamination > 0.0 && contamination < 1.0) {
        return Err(DetectError::invalid(format!(
            "contamination must lie in (0, 1), got {contamination}"
        )));
    }
    Ok(())
}

impl DetectorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<DetectorConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.columns.is_empty() {
            return Err(DetectError::invalid("feature schema is empty"));
        }
        if self.data.histogram_bins == 0 {
            return Err(DetectError::invalid("histogram_bins must be positive"));
        }
        self.forest.validate()?;
        self.scoring.validate()
    }
}
