//! Hooks through which a detection run reports progress.
//!
//! The core never logs on its own; callers inject an observer instead
//! (see [`crate::logging::TracingObserver`]).

use crate::features::NormalizationParams;
use crate::forest::IsolationForest;
use crate::scoring::Detection;

pub trait DetectionObserver: Send + Sync {
    fn normalized(&self, _records: usize, _params: &NormalizationParams) {}

    fn forest_built(&self, _forest: &IsolationForest) {}

    fn scored(&self, _scores: &[f64]) {}

    fn labeled(&self, _detection: &Detection) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DetectionObserver for NoopObserver {}
