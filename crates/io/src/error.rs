//! Error types for lim-io.

use std::path::PathBuf;

use lim_preprocess::PreprocessError;
use lim_resample::ResampleError;

/// Error type for all fallible operations in the lim-io crate.
///
/// Covers missing files, NetCDF library failures, malformed input fields and
/// results containers that cannot be turned back into a consistent run.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a required attribute is absent or has the wrong type.
    #[error("attribute '{name}' on '{variable}' is missing or not an integer")]
    MissingAttribute {
        /// Attribute name.
        name: String,
        /// Variable carrying the attribute.
        variable: String,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when the scratch directory for file-backed staging cannot be
    /// created.
    #[error("cannot create scratch space in {}: {reason}", dir.display())]
    Scratch {
        /// Parent directory of the scratch space.
        dir: PathBuf,
        /// Underlying I/O failure.
        reason: String,
    },

    /// A container decoded into an inconsistent cross-validation result.
    #[error(transparent)]
    Resample(#[from] ResampleError),

    /// A storage-level failure surfaced through preprocessing.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}
