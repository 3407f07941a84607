//! Error types for the lim-resample crate.

use lim_forecast::LimError;
use lim_preprocess::PreprocessError;

/// Error type for all fallible operations in the lim-resample crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResampleError {
    /// Returned when configuration is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the observation series is too short for the requested
    /// holdout, lead times and edge trimming.
    #[error("insufficient data for {context}: {available} samples available, {required} required")]
    InsufficientData {
        /// Which span was being derived.
        context: &'static str,
        /// Samples available.
        available: usize,
        /// Samples required.
        required: usize,
    },

    /// Returned when stored result arrays disagree in shape.
    #[error("inconsistent resample result: {reason}")]
    InconsistentResult {
        /// Description of the mismatch.
        reason: String,
    },

    /// Forecast engine error from a trial refit.
    #[error(transparent)]
    Lim(#[from] LimError),

    /// Preprocessing error.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_config() {
        let e = ResampleError::InvalidConfig {
            reason: "bad".to_string(),
        };
        assert_eq!(e.to_string(), "invalid configuration: bad");
    }

    #[test]
    fn display_insufficient_data() {
        let e = ResampleError::InsufficientData {
            context: "trial start range",
            available: 30,
            required: 36,
        };
        assert_eq!(
            e.to_string(),
            "insufficient data for trial start range: 30 samples available, 36 required"
        );
    }

    #[test]
    fn display_inconsistent_result() {
        let e = ResampleError::InconsistentResult {
            reason: "2 EOF trials for 3 forecast trials".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "inconsistent resample result: 2 EOF trials for 3 forecast trials"
        );
    }

    #[test]
    fn from_lim_error() {
        let le = LimError::InvalidConfig {
            field: "n_modes",
            reason: "must be at least 1".to_string(),
        };
        let re: ResampleError = le.into();
        assert!(matches!(re, ResampleError::Lim(_)));
        assert_eq!(re.to_string(), "invalid n_modes: must be at least 1");
    }

    #[test]
    fn from_preprocess_error() {
        let pe = PreprocessError::PartialYear {
            n_rows: 50,
            year_len: 12,
        };
        let re: ResampleError = pe.into();
        assert!(matches!(re, ResampleError::Preprocess(_)));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<ResampleError>();
    }
}
