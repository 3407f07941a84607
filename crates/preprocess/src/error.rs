//! Error types for the lim-preprocess crate.

/// Error type for all fallible operations in the lim-preprocess crate.
///
/// Every variant is fatal to the call that produced it; no partial results
/// are returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PreprocessError {
    /// Returned when array dimensions do not line up.
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    Shape {
        /// What was being checked.
        context: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when the time dimension is not a whole number of years.
    #[error("{n_rows} samples is not a whole number of years of length {year_len}")]
    PartialYear {
        /// Number of rows in the series.
        n_rows: usize,
        /// Samples per year.
        year_len: usize,
    },

    /// Returned when a running-mean window cannot be applied.
    #[error("window size {window} is invalid for {n_rows} samples")]
    InvalidWindow {
        /// Requested window size.
        window: usize,
        /// Available samples.
        n_rows: usize,
    },

    /// Returned when more EOF modes are requested than the data rank allows.
    #[error("requested {n_modes} EOF modes, must be between 1 and {max} (exclusive)")]
    InvalidModeCount {
        /// Requested number of modes.
        n_modes: usize,
        /// Exclusive upper bound, `min(rows, cols)`.
        max: usize,
    },

    /// Returned when a decomposition or pseudoinverse is numerically degenerate.
    #[error("singular matrix: {reason}")]
    SingularMatrix {
        /// Description of the degeneracy.
        reason: String,
    },

    /// Returned when input contains NaN or infinity.
    #[error("non-finite value in {field}")]
    NonFiniteInput {
        /// Name of the offending input.
        field: &'static str,
    },

    /// Returned when a storage backend operation fails.
    #[error("storage error: {reason}")]
    Storage {
        /// Description of the backend failure.
        reason: String,
    },
}
