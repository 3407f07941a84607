//! Configuration for cross-validation resampling.

use crate::error::ResampleError;

/// Configuration for the cross-validation driver.
///
/// # Example
///
/// ```
/// use lim_resample::ResampleConfig;
///
/// let config = ResampleConfig::new()
///     .with_n_trials(20)
///     .with_holdout_pct(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig {
    n_trials: usize,
    holdout_pct: f64,
}

impl ResampleConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `n_trials = 10`, `holdout_pct = 0.1`.
    pub fn new() -> Self {
        Self {
            n_trials: 10,
            holdout_pct: 0.1,
        }
    }

    /// Sets the number of requested trials. Rounding of start indices may
    /// yield fewer.
    pub fn with_n_trials(mut self, n: usize) -> Self {
        self.n_trials = n;
        self
    }

    /// Sets the fraction of usable years held out per trial.
    pub fn with_holdout_pct(mut self, pct: f64) -> Self {
        self.holdout_pct = pct;
        self
    }

    /// Returns the number of requested trials.
    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    /// Returns the holdout fraction.
    pub fn holdout_pct(&self) -> f64 {
        self.holdout_pct
    }

    /// Validates this configuration.
    ///
    /// Returns an error if `n_trials` is 0 or `holdout_pct` is not in `(0, 1]`.
    pub fn validate(&self) -> Result<(), ResampleError> {
        if self.n_trials == 0 {
            return Err(ResampleError::InvalidConfig {
                reason: "n_trials must be at least 1".to_string(),
            });
        }
        if !self.holdout_pct.is_finite() || self.holdout_pct <= 0.0 || self.holdout_pct > 1.0 {
            return Err(ResampleError::InvalidConfig {
                reason: format!("holdout_pct must be in (0, 1], got {}", self.holdout_pct),
            });
        }
        Ok(())
    }
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self::new()
    }
}
