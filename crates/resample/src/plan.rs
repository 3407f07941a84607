//! Trial start indices and train/test carving.

use lim_forecast::LimConfig;
use lim_preprocess::{EdgeTrim, TrimEdges, trim_edges};
use ndarray::{Array2, ArrayView2, Axis, concatenate, s};
use tracing::{debug, warn};

use crate::config::ResampleConfig;
use crate::error::ResampleError;

/// Index arithmetic for a set of cross-validation trials over one series.
///
/// Start indices index the smoothed (edge-shaved) series; trial `s` holds
/// out raw rows `[s, s + chunk_len)`, which smooth down to the `test_len`
/// samples starting at smoothed index `s`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialPlan {
    n_obs: usize,
    year_length: usize,
    edges: TrimEdges,
    n_use: usize,
    usable_years: usize,
    holdout_chunks: usize,
    test_len: usize,
    max_start: usize,
    n_trials_requested: usize,
    start_indices: Vec<usize>,
}

impl TrialPlan {
    /// Plans trials over a series of `n_obs` raw samples.
    ///
    /// - edges: the running-mean edges shaved to whole years
    /// - `n_use = n_obs - bottom - top`, `usable_years = n_use / year_length`
    /// - `holdout_chunks = ceil(usable_years * holdout_pct)`,
    ///   `test_len = holdout_chunks * window_size`
    /// - `max_start = n_use - test_len - max_lead * window_size`
    /// - start indices are the unique values of
    ///   `round(linspace(0, max_start, n_trials))`
    ///
    /// # Errors
    ///
    /// - Configuration errors from either config.
    /// - [`ResampleError::InsufficientData`] if no usable samples remain or
    ///   the test chunk plus the largest lag does not fit.
    /// - [`ResampleError::InvalidConfig`] if the test chunk is not a whole
    ///   number of years.
    pub fn new(
        n_obs: usize,
        lim_config: &LimConfig,
        config: &ResampleConfig,
    ) -> Result<Self, ResampleError> {
        lim_config.validate()?;
        config.validate()?;

        let window = lim_config.window_size();
        let year_len = lim_config.year_length();
        let edges = trim_edges(window, EdgeTrim::WholeYears(year_len));
        if n_obs <= edges.total() {
            return Err(ResampleError::InsufficientData {
                context: "usable range after edge trimming",
                available: n_obs,
                required: edges.total() + 1,
            });
        }

        let n_use = n_obs - edges.total();
        let usable_years = n_use / year_len;
        let holdout_chunks = (usable_years as f64 * config.holdout_pct()).ceil() as usize;
        if holdout_chunks == 0 {
            return Err(ResampleError::InsufficientData {
                context: "holdout chunk",
                available: n_use,
                required: year_len,
            });
        }
        let test_len = holdout_chunks * window;
        if test_len % year_len != 0 {
            return Err(ResampleError::InvalidConfig {
                reason: format!(
                    "test length {test_len} is not a whole number of years of length {year_len}"
                ),
            });
        }

        let required = test_len + lim_config.lag_of(lim_config.max_lead());
        if n_use < required {
            return Err(ResampleError::InsufficientData {
                context: "trial start range",
                available: n_use,
                required,
            });
        }
        let max_start = n_use - required;
        let start_indices = unique_rounded_linspace(max_start, config.n_trials());

        if start_indices.len() < config.n_trials() {
            warn!(
                requested = config.n_trials(),
                effective = start_indices.len(),
                max_start,
                "rounded start indices collapsed; running fewer trials"
            );
        }
        debug!(n_use, usable_years, holdout_chunks, test_len, max_start, "trial plan");

        Ok(Self {
            n_obs,
            year_length: year_len,
            edges,
            n_use,
            usable_years,
            holdout_chunks,
            test_len,
            max_start,
            n_trials_requested: config.n_trials(),
            start_indices,
        })
    }

    /// Raw series length.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Running-mean edges shaved from every chunk.
    pub fn edges(&self) -> TrimEdges {
        self.edges
    }

    /// Samples left after shaving the full series.
    pub fn n_use(&self) -> usize {
        self.n_use
    }

    /// Whole years in the usable range.
    pub fn usable_years(&self) -> usize {
        self.usable_years
    }

    /// Held-out chunk length in windows.
    pub fn holdout_chunks(&self) -> usize {
        self.holdout_chunks
    }

    /// Smoothed samples per test chunk.
    pub fn test_len(&self) -> usize {
        self.test_len
    }

    /// Raw rows per test chunk, including running-mean padding.
    pub fn chunk_len(&self) -> usize {
        self.test_len + self.edges.total()
    }

    /// Largest permitted start index.
    pub fn max_start(&self) -> usize {
        self.max_start
    }

    /// Trials requested in the configuration.
    pub fn n_trials_requested(&self) -> usize {
        self.n_trials_requested
    }

    /// Trials that will actually run.
    pub fn n_trials(&self) -> usize {
        self.start_indices.len()
    }

    /// Start index of each trial.
    pub fn start_indices(&self) -> &[usize] {
        &self.start_indices
    }

    /// Calendar slot of the first smoothed test sample for a trial starting
    /// at `start`. Anomalies are taken against climatology slot 0, so a
    /// non-zero phase means the test chunk is scored out of phase.
    pub fn start_phase(&self, start: usize) -> usize {
        start % self.year_length
    }

    /// Raw rows left for training in each trial.
    pub fn training_len(&self) -> usize {
        self.n_obs - self.chunk_len()
    }

    /// Splits `obs` into `(training, test)` for the trial starting at `start`.
    ///
    /// The test chunk is raw rows `[start, start + chunk_len)`; training is
    /// the rows before it followed by the rows after it.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InconsistentResult`] if `obs` does not have
    /// `n_obs` rows or the chunk runs past the end.
    pub fn split<'a>(
        &self,
        obs: ArrayView2<'a, f64>,
        start: usize,
    ) -> Result<(Array2<f64>, ArrayView2<'a, f64>), ResampleError> {
        let end = start + self.chunk_len();
        if obs.nrows() != self.n_obs || end > self.n_obs {
            return Err(ResampleError::InconsistentResult {
                reason: format!(
                    "chunk [{start}, {end}) does not fit a series of {} rows planned for {}",
                    obs.nrows(),
                    self.n_obs
                ),
            });
        }
        let phase = self.start_phase(start);
        if phase != 0 {
            debug!(
                start,
                phase,
                year_length = self.year_length,
                "test chunk starts mid-year; climatology applied from slot 0"
            );
        }
        let test = obs.slice_move(s![start..end, ..]);
        let training = concatenate(
            Axis(0),
            &[obs.slice(s![..start, ..]), obs.slice(s![end.., ..])],
        )
        .map_err(|e| ResampleError::InconsistentResult {
            reason: e.to_string(),
        })?;
        Ok((training, test))
    }
}

/// Unique values of `round(linspace(0, max, n))`, ascending.
///
/// Ties round to even. When `n` exceeds `max + 1`, or the spacing is
/// fractional, neighbouring values collapse and fewer than `n` indices are
/// returned.
pub fn unique_rounded_linspace(max: usize, n: usize) -> Vec<usize> {
    let mut out: Vec<usize> = match n {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let step = max as f64 / (n - 1) as f64;
            (0..n)
                .map(|i| (i as f64 * step).round_ties_even() as usize)
                .collect()
        }
    };
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn linspace_collapses_small_range() {
        let starts = unique_rounded_linspace(5, 10);
        assert_eq!(starts, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(starts.len(), 6);
    }

    #[test]
    fn linspace_exact_spacing() {
        assert_eq!(unique_rounded_linspace(72, 10), vec![0, 8, 16, 24, 32, 40, 48, 56, 64, 72]);
        assert_eq!(unique_rounded_linspace(0, 4), vec![0]);
        assert_eq!(unique_rounded_linspace(9, 1), vec![0]);
    }

    #[test]
    fn linspace_ties_round_to_even() {
        // 0, 2.5, 5 -> 0, 2, 5
        assert_eq!(unique_rounded_linspace(5, 3), vec![0, 2, 5]);
    }

    #[test]
    fn plan_collapses_to_six_trials() {
        // window 1, year 1: no trimming; 10 samples, 1 held out, lead 4.
        let lim = LimConfig::new()
            .with_window_size(1)
            .with_year_length(1)
            .with_lead_times(vec![4]);
        let cfg = ResampleConfig::new().with_n_trials(10).with_holdout_pct(0.1);
        let plan = TrialPlan::new(10, &lim, &cfg).unwrap();
        assert_eq!(plan.max_start(), 5);
        assert_eq!(plan.n_trials_requested(), 10);
        assert_eq!(plan.n_trials(), 6);
        assert_eq!(plan.start_indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn plan_monthly_defaults() {
        let plan = TrialPlan::new(120, &LimConfig::new(), &ResampleConfig::new()).unwrap();
        assert_eq!(plan.edges(), TrimEdges::new(12, 12));
        assert_eq!(plan.n_use(), 96);
        assert_eq!(plan.usable_years(), 8);
        // ceil(8 * 0.1) = 1 chunk of 12
        assert_eq!(plan.holdout_chunks(), 1);
        assert_eq!(plan.test_len(), 12);
        assert_eq!(plan.chunk_len(), 36);
        assert_eq!(plan.max_start(), 72);
        assert_eq!(plan.n_trials(), 10);
        assert_eq!(plan.training_len(), 84);
    }

    #[test]
    fn plan_rejects_short_series() {
        let lim = LimConfig::new().with_lead_times(vec![10]);
        let err = TrialPlan::new(120, &lim, &ResampleConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            ResampleError::InsufficientData {
                available: 96,
                required: 132,
                ..
            }
        ));
        assert!(TrialPlan::new(24, &LimConfig::new(), &ResampleConfig::new()).is_err());
    }

    #[test]
    fn plan_rejects_partial_year_chunk() {
        let lim = LimConfig::new().with_window_size(6);
        let err = TrialPlan::new(120, &lim, &ResampleConfig::new()).unwrap_err();
        assert!(matches!(err, ResampleError::InvalidConfig { .. }));
    }

    #[test]
    fn split_carves_chunk() {
        let plan = TrialPlan::new(120, &LimConfig::new(), &ResampleConfig::new()).unwrap();
        let obs = Array2::from_shape_fn((120, 2), |(t, j)| (t * 10 + j) as f64);
        let (train, test) = plan.split(obs.view(), 8).unwrap();
        assert_eq!(test.nrows(), 36);
        assert_eq!(test[[0, 0]], 80.0);
        assert_eq!(train.nrows(), 84);
        assert_eq!(train[[7, 0]], 70.0);
        // Row after the gap is raw row 44.
        assert_eq!(train[[8, 0]], 440.0);
        assert!(plan.split(obs.view(), 90).is_err());
    }

    #[test]
    fn start_phase_tracks_calendar_slot() {
        let plan = TrialPlan::new(120, &LimConfig::new(), &ResampleConfig::new()).unwrap();
        // Starts 0, 8, 16, ..., 72: only multiples of 12 are in phase.
        let phases: Vec<usize> = plan
            .start_indices()
            .iter()
            .map(|&s| plan.start_phase(s))
            .collect();
        assert_eq!(phases, vec![0, 8, 4, 0, 8, 4, 0, 8, 4, 0]);

        let annual = LimConfig::new().with_window_size(1).with_year_length(1);
        let plan = TrialPlan::new(40, &annual, &ResampleConfig::new()).unwrap();
        assert!(plan.start_indices().iter().all(|&s| plan.start_phase(s) == 0));
    }
}
