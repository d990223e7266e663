//! PortMap flow anomaly detection — isolation-forest scoring of network flow statistics.
//!
//! Modular structure:
//! - [`features`] — Feature schema and zero-mean / unit-variance normalization
//! - [`forest`] — Randomized partition trees and the isolation forest ensemble
//! - [`scoring`] — Contamination threshold, labels and the detector facade
//! - [`observer`] — Progress hooks injected into a detection run
//! - [`dataset`] — Flow CSV loading and cleaning
//! - [`report`] — Alert CSV, score histogram and run summary export
//! - [`logging`] — Structured logging and the tracing observer

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forest;
pub mod logging;
pub mod observer;
pub mod report;
pub mod scoring;

pub use config::DetectorConfig;
pub use error::{DetectError, PipelineError, Result};
pub use features::{FeatureMatrix, FeatureSchema, Normalizer};
pub use forest::{IsolationForest, PartitionTree};
pub use observer::DetectionObserver;
pub use scoring::{detect_anomalies, AnomalyDetector, Detection, Label};
pub use logging::StructuredLogger;
