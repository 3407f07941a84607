//! Aggregated output of a cross-validation run.

use ndarray::{Array1, Array2, Array3, Array4, ArrayView3, Axis};

use crate::error::ResampleError;

/// Forecasts and EOFs from every trial, plus the observation anomalies
/// they are scored against.
#[derive(Debug, Clone)]
pub struct ResampleResult {
    forecasts: Array4<f64>,
    eofs: Array3<f64>,
    start_indices: Vec<usize>,
    n_trials_requested: usize,
    test_len: usize,
    lead_times: Vec<u32>,
    year_length: usize,
    window_size: usize,
    anomaly_series: Array2<f64>,
    var_explained: Array1<f64>,
}

/// Parts of a [`ResampleResult`], as produced by a run or read back from a
/// persisted container.
#[derive(Debug, Clone)]
pub struct ResampleParts {
    /// `(trials x leads x modes x test_len)` EOF-space forecasts.
    pub forecasts: Array4<f64>,
    /// `(trials x space x modes)` EOF patterns.
    pub eofs: Array3<f64>,
    pub start_indices: Vec<usize>,
    pub n_trials_requested: usize,
    pub test_len: usize,
    pub lead_times: Vec<u32>,
    pub year_length: usize,
    pub window_size: usize,
    /// `(time x space)` smoothed anomalies of the whole observation series.
    pub anomaly_series: Array2<f64>,
    /// Fraction of variance retained by each trial's modes.
    pub var_explained: Array1<f64>,
}

impl ResampleResult {
    /// Assembles a result, checking that every array agrees on the number
    /// of trials, leads, modes and test samples.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InconsistentResult`] on any disagreement,
    /// or if a trial's lead window runs past the anomaly series.
    pub fn from_parts(parts: ResampleParts) -> Result<Self, ResampleError> {
        let (n_trials, n_leads, n_modes, test_len) = parts.forecasts.dim();
        let (eof_trials, n_space, eof_modes) = parts.eofs.dim();

        let mismatch = |what: &str, a: usize, b: usize| ResampleError::InconsistentResult {
            reason: format!("{what}: {a} vs {b}"),
        };
        if eof_trials != n_trials {
            return Err(mismatch("trials in eofs and forecasts", eof_trials, n_trials));
        }
        if eof_modes != n_modes {
            return Err(mismatch("modes in eofs and forecasts", eof_modes, n_modes));
        }
        if parts.start_indices.len() != n_trials {
            return Err(mismatch("start indices and trials", parts.start_indices.len(), n_trials));
        }
        if parts.var_explained.len() != n_trials {
            return Err(mismatch("variance entries and trials", parts.var_explained.len(), n_trials));
        }
        if parts.lead_times.len() != n_leads {
            return Err(mismatch("lead times and forecast leads", parts.lead_times.len(), n_leads));
        }
        if parts.test_len != test_len {
            return Err(mismatch("test length and forecast samples", parts.test_len, test_len));
        }
        if parts.anomaly_series.ncols() != n_space {
            return Err(mismatch(
                "anomaly columns and eof space",
                parts.anomaly_series.ncols(),
                n_space,
            ));
        }

        let max_lag = parts
            .lead_times
            .iter()
            .map(|&lead| lead as usize * parts.window_size)
            .max()
            .unwrap_or(0);
        if let Some(&last) = parts.start_indices.iter().max() {
            let end = last + max_lag + test_len;
            if end > parts.anomaly_series.nrows() {
                return Err(ResampleError::InconsistentResult {
                    reason: format!(
                        "trial at {last} needs anomaly rows up to {end}, series has {}",
                        parts.anomaly_series.nrows()
                    ),
                });
            }
        }

        Ok(Self {
            forecasts: parts.forecasts,
            eofs: parts.eofs,
            start_indices: parts.start_indices,
            n_trials_requested: parts.n_trials_requested,
            test_len,
            lead_times: parts.lead_times,
            year_length: parts.year_length,
            window_size: parts.window_size,
            anomaly_series: parts.anomaly_series,
            var_explained: parts.var_explained,
        })
    }

    /// Consumes the result, returning its parts.
    pub fn into_parts(self) -> ResampleParts {
        ResampleParts {
            forecasts: self.forecasts,
            eofs: self.eofs,
            start_indices: self.start_indices,
            n_trials_requested: self.n_trials_requested,
            test_len: self.test_len,
            lead_times: self.lead_times,
            year_length: self.year_length,
            window_size: self.window_size,
            anomaly_series: self.anomaly_series,
            var_explained: self.var_explained,
        }
    }

    /// `(trials x leads x modes x test_len)` EOF-space forecasts.
    pub fn forecasts(&self) -> &Array4<f64> {
        &self.forecasts
    }

    /// `(trials x modes x test_len)` forecasts for the lead at `lead_idx`.
    ///
    /// # Panics
    ///
    /// Panics if `lead_idx` is out of range.
    pub fn lead_forecasts(&self, lead_idx: usize) -> ArrayView3<'_, f64> {
        self.forecasts.index_axis(Axis(1), lead_idx)
    }

    /// `(trials x space x modes)` EOF patterns.
    pub fn eofs(&self) -> &Array3<f64> {
        &self.eofs
    }

    /// First smoothed row of each trial's test chunk.
    pub fn start_indices(&self) -> &[usize] {
        &self.start_indices
    }

    /// Number of distinct trials actually run.
    pub fn n_trials(&self) -> usize {
        self.start_indices.len()
    }

    /// Trial count asked for before deduplication.
    pub fn n_trials_requested(&self) -> usize {
        self.n_trials_requested
    }

    /// Smoothed samples in each test chunk.
    pub fn test_len(&self) -> usize {
        self.test_len
    }

    /// Lead times in window units.
    pub fn lead_times(&self) -> &[u32] {
        &self.lead_times
    }

    /// Samples per year.
    pub fn year_length(&self) -> usize {
        self.year_length
    }

    /// Running-mean window in samples.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Lag in samples for the lead at `lead_idx`.
    pub fn lag_for_lead(&self, lead_idx: usize) -> Option<usize> {
        self.lead_times
            .get(lead_idx)
            .map(|&lead| lead as usize * self.window_size)
    }

    /// Smoothed anomalies of the full observation series.
    pub fn anomaly_series(&self) -> &Array2<f64> {
        &self.anomaly_series
    }

    /// Fraction of variance captured by the retained modes, per trial.
    pub fn var_explained(&self) -> &Array1<f64> {
        &self.var_explained
    }

    /// Number of spatial locations.
    pub fn n_space(&self) -> usize {
        self.eofs.len_of(Axis(1))
    }

    /// Number of retained EOF modes.
    pub fn n_modes(&self) -> usize {
        self.eofs.len_of(Axis(2))
    }
}
