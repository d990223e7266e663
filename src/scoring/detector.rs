//! Full detection run: normalize -> fit forest -> score -> threshold -> label.

use super::{Detection, Labeler};
use crate::config::{DetectorConfig, ForestConfig, ScoringConfig};
use crate::error::Result;
use crate::features::{FeatureMatrixView, FeatureSchema, Normalizer};
use crate::forest::IsolationForest;
use crate::observer::{DetectionObserver, NoopObserver};
use std::sync::Arc;

pub struct AnomalyDetector {
    forest: ForestConfig,
    labeler: Labeler,
    schema: Option<FeatureSchema>,
    observer: Arc<dyn DetectionObserver>,
}

impl AnomalyDetector {
    /// Validates both sections up front so a bad configuration fails before
    /// any work is done.
    pub fn new(forest: ForestConfig, scoring: ScoringConfig) -> Result<Self> {
        forest.validate()?;
        Ok(Self {
            forest,
            labeler: Labeler::new(scoring)?,
            schema: None,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Detector whose input width is pinned to the configured feature schema.
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        let mut detector = Self::new(config.forest.clone(), config.scoring.clone())?;
        detector.schema = Some(FeatureSchema::from(&config.features));
        Ok(detector)
    }

    pub fn with_observer(mut self, observer: Arc<dyn DetectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Fits and scores the same batch; no train/test split at this layer.
    pub fn fit_predict(&self, matrix: FeatureMatrixView<'_>) -> Result<Detection> {
        let mut normalizer = match &self.schema {
            Some(schema) => Normalizer::for_schema(schema),
            None => Normalizer::new(),
        };
        let normalized = normalizer.fit_transform(matrix)?;
        if let Some(params) = normalizer.params() {
            self.observer.normalized(normalized.nrows(), params);
        }

        let forest = IsolationForest::fit(normalized.view(), &self.forest)?;
        self.observer.forest_built(&forest);

        let scores = forest.score_batch(normalized.view())?;
        self.observer.scored(&scores);

        let detection = self.labeler.label_batch(scores)?;
        self.observer.labeled(&detection);
        Ok(detection)
    }

    pub fn forest_config(&self) -> &ForestConfig {
        &self.forest
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        self.labeler.config()
    }
}

/// Detection with the default configuration (contamination 0.02, 100 trees,
/// auto subsample size, seed 42).
pub fn detect_anomalies(matrix: FeatureMatrixView<'_>) -> Result<Detection> {
    AnomalyDetector::new(ForestConfig::default(), ScoringConfig::default())?.fit_predict(matrix)
}
