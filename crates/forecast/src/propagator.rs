//! Linear propagators in EOF space.

use lim_preprocess::PreprocessError;
use lim_preprocess::linalg::{matrix_power, matrix_power_by_squaring, pseudo_inverse};
use ndarray::{Array2, ArrayView2};

use crate::error::LimError;

/// A `(modes x modes)` operator advancing an EOF-space state by `lag` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagator {
    matrix: Array2<f64>,
    lag: usize,
}

impl Propagator {
    /// Fits `G = (xt x0ᵀ) · pinv(x0 x0ᵀ)` from paired `(modes x n)` states.
    ///
    /// The `1 / (n - 1)` covariance normalisation cancels and is omitted.
    ///
    /// # Errors
    ///
    /// - [`LimError::InsufficientData`] if there are no pairs.
    /// - [`LimError::Preprocess`] with a shape error if `x0` and `xt` differ in
    ///   shape, or with [`PreprocessError::SingularMatrix`] if `x0 x0ᵀ` has no
    ///   usable pseudoinverse.
    pub fn fit(x0: ArrayView2<'_, f64>, xt: ArrayView2<'_, f64>, lag: usize) -> Result<Self, LimError> {
        if x0.dim() != xt.dim() {
            return Err(PreprocessError::Shape {
                context: "propagator training pairs",
                expected: x0.ncols(),
                got: xt.ncols(),
            }
            .into());
        }
        if x0.ncols() == 0 {
            return Err(LimError::InsufficientData {
                context: "propagator training pairs",
                available: 0,
                required: 1,
            });
        }

        let c0 = x0.dot(&x0.t());
        let ct = xt.dot(&x0.t());
        let matrix = ct.dot(&pseudo_inverse(c0.view())?);
        Ok(Self { matrix, lag })
    }

    /// Wraps an existing square matrix.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `matrix` is not square.
    pub fn from_matrix(matrix: Array2<f64>, lag: usize) -> Result<Self, LimError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(PreprocessError::Shape {
                context: "propagator matrix",
                expected: matrix.nrows(),
                got: matrix.ncols(),
            }
            .into());
        }
        Ok(Self { matrix, lag })
    }

    /// The operator matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Lag in samples.
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Number of modes.
    pub fn n_modes(&self) -> usize {
        self.matrix.nrows()
    }

    /// `G^k` by repeated matrix multiplication, with lag `k * lag`.
    pub fn power(&self, k: u32) -> Self {
        Self {
            matrix: matrix_power(self.matrix.view(), k),
            lag: self.lag * k as usize,
        }
    }

    /// `G^k` by binary exponentiation, with lag `k * lag`.
    pub fn power_by_squaring(&self, k: u32) -> Self {
        Self {
            matrix: matrix_power_by_squaring(self.matrix.view(), k),
            lag: self.lag * k as usize,
        }
    }

    /// Advances `(modes x samples)` states by one application.
    ///
    /// # Errors
    ///
    /// Returns a shape error if `state` does not have one row per mode.
    pub fn apply(&self, state: ArrayView2<'_, f64>) -> Result<Array2<f64>, LimError> {
        if state.nrows() != self.n_modes() {
            return Err(PreprocessError::Shape {
                context: "propagator state",
                expected: self.n_modes(),
                got: state.nrows(),
            }
            .into());
        }
        Ok(self.matrix.dot(&state))
    }
}
