use crate::features::NormalizationParams;
use crate::forest::IsolationForest;
use crate::observer::DetectionObserver;
use crate::scoring::Detection;
use tracing::{debug, info};

/// Forwards detection progress to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DetectionObserver for TracingObserver {
    fn normalized(&self, records: usize, params: &NormalizationParams) {
        info!(records, features = params.width(), "features normalized");
    }

    fn forest_built(&self, forest: &IsolationForest) {
        info!(
            trees = forest.n_trees(),
            subsample_size = forest.subsample_size(),
            "isolation forest trained"
        );
    }

    fn scored(&self, scores: &[f64]) {
        debug!(records = scores.len(), "records scored");
    }

    fn labeled(&self, detection: &Detection) {
        info!(
            anomalies = detection.anomaly_count(),
            records = detection.len(),
            threshold = detection.threshold,
            "anomalies detected"
        );
    }
}
