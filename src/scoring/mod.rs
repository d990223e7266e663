//! Turns forest scores into labels via a contamination-derived threshold.

mod detector;
mod labeler;

pub use detector::{detect_anomalies, AnomalyDetector};
pub use labeler::{anomaly_indices, label, threshold_for_contamination, Detection, Label, Labeler};
