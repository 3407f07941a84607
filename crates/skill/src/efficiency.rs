//! Coefficient of efficiency against a climatological baseline.

use ndarray::{Array1, ArrayView2, Axis};

use crate::correlations::check_same_shape;
use crate::error::SkillError;

/// Coefficient of efficiency at each location:
///
/// `CE = 1 - Σ(f - o)² / Σ(o - mean(reference))²`
///
/// where the baseline is the time mean of `reference` at that location.
/// 1 is a perfect forecast and 0 is no better than the baseline. Locations
/// where the observations equal the baseline throughout are NaN.
///
/// # Errors
///
/// Returns [`SkillError::Shape`] if `fcast` and `obs` differ in shape, or
/// `reference` has no rows or a different number of columns.
pub fn coefficient_of_efficiency(
    fcast: ArrayView2<'_, f64>,
    obs: ArrayView2<'_, f64>,
    reference: ArrayView2<'_, f64>,
) -> Result<Array1<f64>, SkillError> {
    check_same_shape(fcast, obs)?;
    if reference.ncols() != obs.ncols() {
        return Err(SkillError::Shape {
            context: "reference locations",
            expected: obs.ncols(),
            got: reference.ncols(),
        });
    }
    let baseline = reference.mean_axis(Axis(0)).ok_or(SkillError::Shape {
        context: "reference samples",
        expected: 1,
        got: 0,
    })?;

    let err = (&fcast - &obs).mapv(|d| d * d).sum_axis(Axis(0));
    let spread = (&obs - &baseline).mapv(|d| d * d).sum_axis(Axis(0));

    Ok(err
        .iter()
        .zip(spread.iter())
        .map(|(&e, &s)| if s == 0.0 { f64::NAN } else { 1.0 - e / s })
        .collect())
}
