//! Feature schema selection and standardization of flow metrics.

mod normalizer;
mod schema;

pub use normalizer::{NormalizationParams, Normalizer};
pub use schema::FeatureSchema;

use ndarray::{Array2, ArrayView2};

/// Records x features, one row per flow.
pub type FeatureMatrix = Array2<f64>;

/// Borrowed view of a feature matrix.
pub type FeatureMatrixView<'a> = ArrayView2<'a, f64>;

/// Flow metrics scored in the reference PortMap deployment.
pub const FLOW_FEATURES: [&str; 12] = [
    "Flow Duration",
    "Total Fwd Packets",
    "Total Backward Packets",
    "Total Length of Fwd Packets",
    "Total Length of Bwd Packets",
    "Flow IAT Mean",
    "Flow IAT Std",
    "Flow IAT Max",
    "Fwd IAT Mean",
    "Bwd IAT Mean",
    "Fwd Packets/s",
    "Bwd Packets/s",
];

/// Fails with `InvalidInput` on an empty matrix or any non-finite value.
pub(crate) fn ensure_finite(matrix: FeatureMatrixView<'_>) -> crate::Result<()> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(crate::DetectError::invalid(format!(
            "feature matrix is empty ({}x{})",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    if let Some(((row, col), v)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(crate::DetectError::invalid(format!(
            "non-finite value {v} at row {row}, column {col}"
        )));
    }
    Ok(())
}
