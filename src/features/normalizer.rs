//! Zero-mean / unit-variance rescaling of the selected flow metrics.

use super::{ensure_finite, FeatureMatrix, FeatureMatrixView, FeatureSchema};
use crate::error::{DetectError, Result};
use ndarray::{Array1, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature mean and (population) standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub means: Array1<f64>,
    /// Never zero: constant columns record 1.0.
    pub stds: Array1<f64>,
}

impl NormalizationParams {
    fn from_matrix(matrix: FeatureMatrixView<'_>) -> Self {
        let width = matrix.ncols();
        let mut means = Array1::zeros(width);
        let mut stds = Array1::ones(width);

        for (j, col) in matrix.axis_iter(Axis(1)).enumerate() {
            let (min, max) = col
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                    (lo.min(x), hi.max(x))
                });
            if min == max {
                // Exact mean so the column maps to zeros, not rounding noise.
                means[j] = min;
                continue;
            }
            let (mut mean, mut std) = moments(col, 1.0);
            if !(mean.is_finite() && std.is_finite()) {
                // Sums overflowed; redo them in units of the largest magnitude.
                (mean, std) = moments(col, min.abs().max(max.abs()));
            }
            means[j] = mean;
            stds[j] = if std == 0.0 { 1.0 } else { std };
        }
        Self { means, stds }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }
}

/// Standardizes feature matrices with parameters fit once per run.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    expected_width: Option<usize>,
    params: Option<NormalizationParams>,
}

impl Normalizer {
    /// Normalizer that infers the width from the first `fit`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer whose fit input must have one column per schema feature.
    pub fn for_schema(schema: &FeatureSchema) -> Self {
        Self {
            expected_width: Some(schema.len()),
            params: None,
        }
    }

    pub fn params(&self) -> Option<&NormalizationParams> {
        self.params.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn fit(&mut self, matrix: FeatureMatrixView<'_>) -> Result<&NormalizationParams> {
        if self.params.is_some() {
            return Err(DetectError::invalid("normalizer is already fitted"));
        }
        if let Some(expected) = self.expected_width {
            if matrix.ncols() != expected {
                return Err(DetectError::Dimension {
                    expected,
                    actual: matrix.ncols(),
                });
            }
        }
        ensure_finite(matrix)?;
        Ok(&*self.params.insert(NormalizationParams::from_matrix(matrix)))
    }

    /// Apply `(x - mean) / std` with the fitted parameters.
    pub fn transform(&self, matrix: FeatureMatrixView<'_>) -> Result<FeatureMatrix> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| DetectError::invalid("normalizer used before fit"))?;
        if matrix.ncols() != params.width() {
            return Err(DetectError::Dimension {
                expected: params.width(),
                actual: matrix.ncols(),
            });
        }
        ensure_finite(matrix)?;

        let mut out = matrix.to_owned();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, std) = (params.means[j], params.stds[j]);
            col.mapv_inplace(|x| standardize(x, mean, std));
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, matrix: FeatureMatrixView<'_>) -> Result<FeatureMatrix> {
        self.fit(matrix)?;
        self.transform(matrix)
    }
}

/// Mean and population std of `col`, accumulated on `col / scale`.
fn moments(col: ArrayView1<'_, f64>, scale: f64) -> (f64, f64) {
    let n = col.len() as f64;
    let mean = col.iter().map(|x| x / scale).sum::<f64>() / n;
    let var = col
        .iter()
        .map(|x| (x / scale - mean) * (x / scale - mean))
        .sum::<f64>()
        / n;
    (mean * scale, var.sqrt() * scale)
}

fn standardize(x: f64, mean: f64, std: f64) -> f64 {
    let centered = x - mean;
    if centered.is_finite() {
        centered / std
    } else {
        x / std - mean / std
    }
}
