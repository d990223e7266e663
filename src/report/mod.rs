//! Outputs handed to reporting consumers: alert CSV, score histogram, run summary.

mod alerts;
mod histogram;

pub use alerts::{AlertRow, AlertSummary, CONTEXT_COLUMNS};
pub use histogram::ScoreHistogram;

use crate::error::PipelineError;
use crate::scoring::Detection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub flows_processed: usize,
    pub anomalies: usize,
    pub anomaly_rate: f64,
    pub threshold: f64,
    pub generated_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn from_detection(detection: &Detection) -> Self {
        Self {
            flows_processed: detection.len(),
            anomalies: detection.anomaly_count(),
            anomaly_rate: detection.anomaly_rate(),
            threshold: detection.threshold,
            generated_at: Utc::now(),
        }
    }
}

/// Pretty-printed JSON file.
pub fn write_json(value: &impl Serialize, path: &Path) -> Result<(), PipelineError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
