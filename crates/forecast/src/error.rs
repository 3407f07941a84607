//! Error types for the lim-forecast crate.

use lim_preprocess::PreprocessError;

/// Error type for all fallible operations in the lim-forecast crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LimError {
    /// Preprocessing error (shape, window, mode count, singular matrix).
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// Returned when a configuration value is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when a training span is empty after lag or edge removal.
    #[error("insufficient data for {context}: {available} samples available, at least {required} required")]
    InsufficientData {
        /// Which span was being derived.
        context: &'static str,
        /// Samples available.
        available: usize,
        /// Samples required.
        required: usize,
    },

    /// Returned when the initial state and calibration have different
    /// numbers of spatial locations.
    #[error("initial data has {initial} locations, calibration has {calibration}")]
    SpaceMismatch {
        /// Locations in the calibration data.
        calibration: usize,
        /// Locations in the initial data.
        initial: usize,
    },
}
