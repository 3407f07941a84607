//! Dense linear algebra helpers bridging ndarray and nalgebra.

use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};

use crate::error::PreprocessError;

/// Relative cutoff for small singular values in [`pseudo_inverse`].
pub const PINV_RCOND: f64 = 1e-15;

/// Copies an ndarray matrix into a nalgebra matrix.
pub fn to_dmatrix(a: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Copies a nalgebra matrix into an ndarray matrix.
pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Moore-Penrose pseudoinverse via SVD.
///
/// Singular values below `PINV_RCOND * s_max` are treated as zero.
///
/// # Errors
///
/// Returns [`PreprocessError::SingularMatrix`] if the input is empty,
/// contains non-finite values, or has no non-zero singular value.
pub fn pseudo_inverse(a: ArrayView2<'_, f64>) -> Result<Array2<f64>, PreprocessError> {
    if a.is_empty() {
        return Err(PreprocessError::SingularMatrix {
            reason: "cannot invert an empty matrix".to_string(),
        });
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(PreprocessError::SingularMatrix {
            reason: "matrix contains non-finite entries".to_string(),
        });
    }

    let svd = to_dmatrix(a).svd(true, true);
    let s_max = svd.singular_values.max();
    if !s_max.is_finite() || s_max <= 0.0 {
        return Err(PreprocessError::SingularMatrix {
            reason: format!("largest singular value is {s_max}"),
        });
    }

    let pinv = svd
        .pseudo_inverse(PINV_RCOND * s_max)
        .map_err(|e| PreprocessError::SingularMatrix {
            reason: e.to_string(),
        })?;
    Ok(from_dmatrix(&pinv))
}

/// `a^k` by repeated multiplication; `a^0` is the identity.
///
/// # Panics
///
/// Panics if `a` is not square.
pub fn matrix_power(a: ArrayView2<'_, f64>, k: u32) -> Array2<f64> {
    assert_eq!(a.nrows(), a.ncols(), "matrix_power: matrix must be square");
    let mut result = Array2::<f64>::eye(a.nrows());
    for _ in 0..k {
        result = result.dot(&a);
    }
    result
}

/// `a^k` by binary exponentiation; `a^0` is the identity.
///
/// # Panics
///
/// Panics if `a` is not square.
pub fn matrix_power_by_squaring(a: ArrayView2<'_, f64>, k: u32) -> Array2<f64> {
    assert_eq!(a.nrows(), a.ncols(), "matrix_power_by_squaring: matrix must be square");
    let mut result = Array2::<f64>::eye(a.nrows());
    let mut base = a.to_owned();
    let mut k = k;
    while k > 0 {
        if k & 1 == 1 {
            result = result.dot(&base);
        }
        k >>= 1;
        if k > 0 {
            base = base.dot(&base);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn dmatrix_round_trip() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = to_dmatrix(a.view());
        assert_eq!(m[(1, 2)], 6.0);
        assert_eq!(from_dmatrix(&m), a);
    }

    #[test]
    fn pinv_of_invertible_is_inverse() {
        let a = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = pseudo_inverse(a.view()).unwrap();
        assert_abs_diff_eq!(a.dot(&inv), Array2::<f64>::eye(2), epsilon = 1e-12);
    }

    #[test]
    fn pinv_of_rank_deficient() {
        // Rank 1: pinv(a) = a^T / ||a||_F^2 for an outer product.
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let pinv = pseudo_inverse(a.view()).unwrap();
        assert_abs_diff_eq!(pinv, a.t().to_owned() / 25.0, epsilon = 1e-12);
        // Moore-Penrose condition A A+ A = A.
        assert_abs_diff_eq!(a.dot(&pinv).dot(&a), a, epsilon = 1e-12);
    }

    #[test]
    fn pinv_of_zero_is_singular() {
        let a = Array2::<f64>::zeros((3, 3));
        assert!(matches!(
            pseudo_inverse(a.view()),
            Err(PreprocessError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn pinv_rejects_nan() {
        let a = array![[1.0, f64::NAN], [0.0, 1.0]];
        assert!(pseudo_inverse(a.view()).is_err());
    }

    #[test]
    fn power_zero_is_identity() {
        let a = array![[0.5, 0.1], [0.2, 0.9]];
        assert_eq!(matrix_power(a.view(), 0), Array2::<f64>::eye(2));
        assert_eq!(matrix_power_by_squaring(a.view(), 0), Array2::<f64>::eye(2));
    }

    #[test]
    fn power_methods_agree() {
        let a = array![[0.8, 0.1, -0.05], [0.2, 0.7, 0.1], [0.0, -0.1, 0.9]];
        for k in 1..12 {
            assert_abs_diff_eq!(
                matrix_power(a.view(), k),
                matrix_power_by_squaring(a.view(), k),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn power_three_is_triple_product() {
        let a = array![[1.0, 1.0], [0.0, 1.0]];
        assert_eq!(matrix_power(a.view(), 3), array![[1.0, 3.0], [0.0, 1.0]]);
    }
}
