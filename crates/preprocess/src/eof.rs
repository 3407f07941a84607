//! Empirical orthogonal functions via SVD.

use ndarray::{Array1, Array2, ArrayView2};
use tracing::debug;

use crate::error::PreprocessError;
use crate::linalg::to_dmatrix;

/// Truncated EOF basis of a space x time matrix.
///
/// Pattern signs are whatever the SVD returns; two decompositions of the same
/// data may differ by the sign of any column.
#[derive(Debug, Clone)]
pub struct EofBasis {
    patterns: Array2<f64>,
    eigenvalues: Array1<f64>,
    var_explained: f64,
}

impl EofBasis {
    /// Assembles a basis from stored parts.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::Shape`] if the number of eigenvalues does
    /// not match the number of pattern columns.
    pub fn from_parts(
        patterns: Array2<f64>,
        eigenvalues: Array1<f64>,
        var_explained: f64,
    ) -> Result<Self, PreprocessError> {
        if eigenvalues.len() != patterns.ncols() {
            return Err(PreprocessError::Shape {
                context: "EOF eigenvalues",
                expected: patterns.ncols(),
                got: eigenvalues.len(),
            });
        }
        Ok(Self {
            patterns,
            eigenvalues,
            var_explained,
        })
    }

    /// Spatial patterns, `(space x n_modes)`.
    pub fn patterns(&self) -> &Array2<f64> {
        &self.patterns
    }

    /// Eigenvalues of the retained modes, descending.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Fraction of total variance captured by the retained modes.
    pub fn var_explained(&self) -> f64 {
        self.var_explained
    }

    /// Number of retained modes.
    pub fn n_modes(&self) -> usize {
        self.patterns.ncols()
    }

    /// Number of spatial locations.
    pub fn n_space(&self) -> usize {
        self.patterns.nrows()
    }

    /// Projects a time x space matrix onto the basis, giving `(modes x time)`.
    pub fn project(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, PreprocessError> {
        if data.ncols() != self.n_space() {
            return Err(PreprocessError::Shape {
                context: "EOF projection columns",
                expected: self.n_space(),
                got: data.ncols(),
            });
        }
        Ok(self.patterns.t().dot(&data.t()))
    }

    /// Maps `(modes x time)` coefficients back to a time x space matrix.
    pub fn reconstruct(&self, coeffs: ArrayView2<'_, f64>) -> Result<Array2<f64>, PreprocessError> {
        if coeffs.nrows() != self.n_modes() {
            return Err(PreprocessError::Shape {
                context: "EOF reconstruction modes",
                expected: self.n_modes(),
                got: coeffs.nrows(),
            });
        }
        Ok(coeffs.t().dot(&self.patterns.t()))
    }
}

/// Computes the leading `n_modes` EOFs of a space x time matrix.
///
/// Eigenvalues are `s^2 / (n_samples - 1)` with `n_samples` the number of
/// columns; the variance fraction is the retained eigenvalue sum over the sum
/// of all eigenvalues.
///
/// # Errors
///
/// - [`PreprocessError::InvalidModeCount`] if `n_modes` is 0 or not below
///   `min(rows, cols)`.
/// - [`PreprocessError::NonFiniteInput`] if the data contains NaN or infinity.
/// - [`PreprocessError::SingularMatrix`] if the data has zero variance.
pub fn calc_eofs(data: ArrayView2<'_, f64>, n_modes: usize) -> Result<EofBasis, PreprocessError> {
    let (n_space, n_samples) = data.dim();
    let max = n_space.min(n_samples);
    if n_modes == 0 || n_modes >= max {
        return Err(PreprocessError::InvalidModeCount { n_modes, max });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(PreprocessError::NonFiniteInput { field: "EOF input" });
    }

    let svd = to_dmatrix(data).svd(true, false);
    let u = svd.u.ok_or_else(|| PreprocessError::SingularMatrix {
        reason: "SVD returned no left singular vectors".to_string(),
    })?;
    let singular = svd.singular_values;

    let mut order: Vec<usize> = (0..singular.len()).collect();
    order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

    let denom = (n_samples - 1) as f64;
    let all_eigs: Vec<f64> = order.iter().map(|&k| singular[k].powi(2) / denom).collect();
    let total: f64 = all_eigs.iter().sum();
    if total <= 0.0 {
        return Err(PreprocessError::SingularMatrix {
            reason: "EOF input has zero variance".to_string(),
        });
    }

    let eigenvalues = Array1::from_iter(all_eigs[..n_modes].iter().copied());
    let var_explained = eigenvalues.sum() / total;
    let patterns = Array2::from_shape_fn((n_space, n_modes), |(i, m)| u[(i, order[m])]);

    debug!(n_space, n_samples, n_modes, var_explained, "EOFs computed");

    Ok(EofBasis {
        patterns,
        eigenvalues,
        var_explained,
    })
}
