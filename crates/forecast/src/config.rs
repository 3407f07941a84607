//! Model and forecast configuration.

use crate::error::LimError;

/// How per-lead propagators are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitMode {
    /// Fit one propagator at a lag of one window and raise it to the integer
    /// power of each lead time.
    #[default]
    Lag1Power,
    /// Fit a separate propagator at each lead's lag.
    Direct,
}

/// Configuration for a [`Lim`](crate::Lim).
///
/// # Example
///
/// ```
/// use lim_forecast::LimConfig;
///
/// let config = LimConfig::new()
///     .with_window_size(12)
///     .with_lead_times(vec![1, 2, 3])
///     .with_n_modes(5);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_lead(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LimConfig {
    window_size: usize,
    year_length: usize,
    /// Lead times in units of `window_size`.
    lead_times: Vec<u32>,
    n_modes: usize,
}

impl LimConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: `window_size = 12`, `year_length = 12`, `lead_times = [1]`,
    /// `n_modes = 10`.
    pub fn new() -> Self {
        Self {
            window_size: 12,
            year_length: 12,
            lead_times: vec![1],
            n_modes: 10,
        }
    }

    /// Sets the running-mean window, which is also the base lag.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the number of samples per year.
    pub fn with_year_length(mut self, year_length: usize) -> Self {
        self.year_length = year_length;
        self
    }

    /// Sets the lead times, in units of the window size.
    pub fn with_lead_times(mut self, lead_times: Vec<u32>) -> Self {
        self.lead_times = lead_times;
        self
    }

    /// Sets the number of retained EOF modes.
    pub fn with_n_modes(mut self, n_modes: usize) -> Self {
        self.n_modes = n_modes;
        self
    }

    /// Returns the window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns the year length.
    pub fn year_length(&self) -> usize {
        self.year_length
    }

    /// Returns the lead times.
    pub fn lead_times(&self) -> &[u32] {
        &self.lead_times
    }

    /// Returns the number of retained EOF modes.
    pub fn n_modes(&self) -> usize {
        self.n_modes
    }

    /// Largest lead time, or 0 if none are set.
    pub fn max_lead(&self) -> u32 {
        self.lead_times.iter().copied().max().unwrap_or(0)
    }

    /// Lag in samples for a lead time.
    pub fn lag_of(&self, lead: u32) -> usize {
        lead as usize * self.window_size
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LimError::InvalidConfig`] if the window, year length or mode
    /// count is zero, or if the lead times are empty or contain zero.
    pub fn validate(&self) -> Result<(), LimError> {
        if self.window_size == 0 {
            return Err(LimError::InvalidConfig {
                field: "window_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.year_length == 0 {
            return Err(LimError::InvalidConfig {
                field: "year_length",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.lead_times.is_empty() {
            return Err(LimError::InvalidConfig {
                field: "lead_times",
                reason: "must not be empty".to_string(),
            });
        }
        if self.lead_times.contains(&0) {
            return Err(LimError::InvalidConfig {
                field: "lead_times",
                reason: "lead times must be positive integers".to_string(),
            });
        }
        if self.n_modes == 0 {
            return Err(LimError::InvalidConfig {
                field: "n_modes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for LimConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call forecast options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForecastOptions {
    fit_mode: FitMode,
    detrend: bool,
}

impl ForecastOptions {
    /// Lag-1 power mode without detrending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the propagator fit mode.
    pub fn with_fit_mode(mut self, fit_mode: FitMode) -> Self {
        self.fit_mode = fit_mode;
        self
    }

    /// Enables linear detrending of the calibration anomalies.
    ///
    /// The initial state is never detrended.
    pub fn with_detrend(mut self, detrend: bool) -> Self {
        self.detrend = detrend;
        self
    }

    /// Returns the fit mode.
    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    /// Returns whether calibration anomalies are detrended.
    pub fn detrend(&self) -> bool {
        self.detrend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LimConfig::default();
        assert_eq!(cfg.window_size(), 12);
        assert_eq!(cfg.year_length(), 12);
        assert_eq!(cfg.lead_times(), &[1]);
        assert_eq!(cfg.n_modes(), 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let cfg = LimConfig::new()
            .with_window_size(6)
            .with_year_length(4)
            .with_lead_times(vec![3, 1, 2])
            .with_n_modes(2);
        assert_eq!(cfg.window_size(), 6);
        assert_eq!(cfg.year_length(), 4);
        assert_eq!(cfg.max_lead(), 3);
        assert_eq!(cfg.lag_of(2), 12);
        assert_eq!(cfg.n_modes(), 2);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let cfg = LimConfig::new().with_window_size(0);
        assert!(matches!(
            cfg.validate(),
            Err(LimError::InvalidConfig {
                field: "window_size",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_leads() {
        assert!(LimConfig::new().with_lead_times(vec![]).validate().is_err());
        assert!(
            LimConfig::new()
                .with_lead_times(vec![1, 0])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_zero_modes() {
        assert!(LimConfig::new().with_n_modes(0).validate().is_err());
        assert!(LimConfig::new().with_year_length(0).validate().is_err());
    }

    #[test]
    fn test_options() {
        let opts = ForecastOptions::new();
        assert_eq!(opts.fit_mode(), FitMode::Lag1Power);
        assert!(!opts.detrend());
        let opts = opts.with_fit_mode(FitMode::Direct).with_detrend(true);
        assert_eq!(opts.fit_mode(), FitMode::Direct);
        assert!(opts.detrend());
    }
}
