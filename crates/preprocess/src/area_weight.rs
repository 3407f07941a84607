//! Latitude area weighting.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::PreprocessError;

/// Per-column weights `sqrt(|cos(lat)|)` for latitudes in degrees.
pub fn area_weights(lats: ArrayView1<'_, f64>) -> Array1<f64> {
    lats.mapv(|lat| lat.to_radians().cos().abs().sqrt())
}

/// Scales each column of a time x space matrix by its area weight.
///
/// # Errors
///
/// Returns [`PreprocessError::Shape`] if `lats` does not have one entry per
/// column.
pub fn area_weight(
    data: ArrayView2<'_, f64>,
    lats: ArrayView1<'_, f64>,
) -> Result<Array2<f64>, PreprocessError> {
    if lats.len() != data.ncols() {
        return Err(PreprocessError::Shape {
            context: "latitude vector",
            expected: data.ncols(),
            got: lats.len(),
        });
    }
    Ok(&data * &area_weights(lats))
}
