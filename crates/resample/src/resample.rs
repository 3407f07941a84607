//! Cross-validation driver: refit a LIM for every held-out chunk.

use lim_forecast::{ForecastOptions, Lim, LimConfig};
use lim_preprocess::{
    EdgeTrim, MemoryStorage, PreprocessError, StagingCache, Storage, calc_anomaly, running_mean,
};
use ndarray::{Array1, Array2, Array3, Array4, Axis};
use tracing::{debug, info};

use crate::config::ResampleConfig;
use crate::error::ResampleError;
use crate::plan::TrialPlan;
use crate::result::{ResampleParts, ResampleResult};

/// Repeatedly holds out a chunk of the observations, calibrates a fresh
/// [`Lim`] on the rest and forecasts from the held-out chunk.
#[derive(Debug, Clone)]
pub struct ResampleLim {
    observations: Array2<f64>,
    lim_config: LimConfig,
    config: ResampleConfig,
    plan: TrialPlan,
    lats: Option<Array1<f64>>,
}

impl ResampleLim {
    /// Plans the trials for a raw `(time x space)` observation matrix.
    ///
    /// # Errors
    ///
    /// - Any [`TrialPlan::new`] error.
    /// - [`ResampleError::InsufficientData`] if a trial's training rows do
    ///   not survive edge trimming.
    /// - [`PreprocessError::PartialYear`] if the usable range is not a whole
    ///   number of years.
    /// - [`PreprocessError::NonFiniteInput`] on NaN or infinite samples.
    pub fn new(
        observations: Array2<f64>,
        lim_config: LimConfig,
        config: ResampleConfig,
    ) -> Result<Self, ResampleError> {
        let plan = TrialPlan::new(observations.nrows(), &lim_config, &config)?;
        if observations.iter().any(|v| !v.is_finite()) {
            return Err(PreprocessError::NonFiniteInput {
                field: "observations",
            }
            .into());
        }

        let trimmed = plan.edges().total();
        if plan.training_len() <= trimmed {
            return Err(ResampleError::InsufficientData {
                context: "training rows after holdout",
                available: plan.training_len(),
                required: trimmed + 1,
            });
        }
        let year_len = lim_config.year_length();
        if plan.n_use() % year_len != 0 {
            return Err(PreprocessError::PartialYear {
                n_rows: plan.n_use(),
                year_len,
            }
            .into());
        }

        Ok(Self {
            observations,
            lim_config,
            config,
            plan,
            lats: None,
        })
    }

    /// Area-weights every trial's EOFs by these latitudes.
    ///
    /// # Errors
    ///
    /// Returns a shape error if there is not one latitude per column.
    pub fn with_lats(mut self, lats: Array1<f64>) -> Result<Self, ResampleError> {
        if lats.len() != self.observations.ncols() {
            return Err(PreprocessError::Shape {
                context: "latitude vector",
                expected: self.observations.ncols(),
                got: lats.len(),
            }
            .into());
        }
        self.lats = Some(lats);
        Ok(self)
    }

    /// Trial layout derived from the observation length.
    pub fn plan(&self) -> &TrialPlan {
        &self.plan
    }

    /// Cross-validation settings.
    pub fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Model settings shared by every trial.
    pub fn lim_config(&self) -> &LimConfig {
        &self.lim_config
    }

    /// Raw `(time x space)` observations.
    pub fn observations(&self) -> &Array2<f64> {
        &self.observations
    }

    /// Runs every trial with in-memory staging.
    pub fn run(&self, options: &ForecastOptions) -> Result<ResampleResult, ResampleError> {
        let mut storage = MemoryStorage::new();
        let mut cache = StagingCache::unbounded();
        self.run_with_storage(options, &mut storage, &mut cache)
    }

    /// Runs every trial, staging running means through `storage`.
    ///
    /// Trial `i` calibrates on the observations outside its chunk and
    /// forecasts from the chunk itself. Its EOF-space forecasts land in
    /// `forecasts[i]` and its patterns in `eofs[i]`. The observations are
    /// also smoothed and anomalised as a whole against their own
    /// climatology, giving the series trials are scored against.
    ///
    /// # Errors
    ///
    /// Any error from a trial's refit aborts the run.
    #[tracing::instrument(skip_all, fields(
        n_trials = self.plan.n_trials(),
        test_len = self.plan.test_len(),
    ))]
    pub fn run_with_storage<S: Storage>(
        &self,
        options: &ForecastOptions,
        storage: &mut S,
        cache: &mut StagingCache,
    ) -> Result<ResampleResult, ResampleError> {
        let window = self.lim_config.window_size();
        let year_len = self.lim_config.year_length();
        let n_trials = self.plan.n_trials();
        let n_leads = self.lim_config.lead_times().len();
        let n_modes = self.lim_config.n_modes();
        let n_space = self.observations.ncols();
        let test_len = self.plan.test_len();

        let smoothed = running_mean(
            self.observations.view(),
            window,
            EdgeTrim::WholeYears(year_len),
        )?;
        let (anomaly_series, _) = calc_anomaly(smoothed.data().view(), year_len, None)?.into_parts();

        let mut forecasts = Array4::zeros((n_trials, n_leads, n_modes, test_len));
        let mut eofs = Array3::zeros((n_trials, n_space, n_modes));
        let mut var_explained = Array1::zeros(n_trials);

        for (i, &start) in self.plan.start_indices().iter().enumerate() {
            let (training, test) = self.plan.split(self.observations.view(), start)?;
            let mut lim = Lim::new(training, self.lim_config.clone())?;
            if let Some(lats) = &self.lats {
                lim = lim.with_lats(lats.clone())?;
            }
            let fcast = lim.forecast_with_storage(test, options, storage, cache)?;
            if fcast.n_samples() != test_len {
                return Err(ResampleError::InconsistentResult {
                    reason: format!(
                        "trial {i} produced {} samples, expected {test_len}",
                        fcast.n_samples()
                    ),
                });
            }

            forecasts.index_axis_mut(Axis(0), i).assign(fcast.tensor());
            eofs.index_axis_mut(Axis(0), i).assign(fcast.eofs().patterns());
            var_explained[i] = fcast.eofs().var_explained();
            debug!(
                trial = i,
                start,
                var_explained = var_explained[i],
                "trial complete"
            );
        }

        info!(
            n_trials,
            requested = self.plan.n_trials_requested(),
            mean_var_explained = var_explained.mean().unwrap_or(f64::NAN),
            "resampling complete"
        );

        ResampleResult::from_parts(ResampleParts {
            forecasts,
            eofs,
            start_indices: self.plan.start_indices().to_vec(),
            n_trials_requested: self.plan.n_trials_requested(),
            test_len,
            lead_times: self.lim_config.lead_times().to_vec(),
            year_length: year_len,
            window_size: window,
            anomaly_series,
            var_explained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, cols), |(t, j)| {
            (t as f64 * 0.37 + j as f64).sin() + 0.4 * (t as f64 * 0.045 * (j + 1) as f64).cos()
        })
    }

    #[test]
    fn rejects_non_finite() {
        let mut obs = field(120, 3);
        obs[[10, 2]] = f64::INFINITY;
        assert!(matches!(
            ResampleLim::new(obs, LimConfig::new(), ResampleConfig::new()),
            Err(ResampleError::Preprocess(PreprocessError::NonFiniteInput { .. }))
        ));
    }

    #[test]
    fn rejects_partial_year_range() {
        // 126 rows leave 102 usable: not whole years of 12.
        let err = ResampleLim::new(field(126, 3), LimConfig::new(), ResampleConfig::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ResampleError::Preprocess(PreprocessError::PartialYear { n_rows: 102, year_len: 12 })
        ));
    }

    #[test]
    fn rejects_bad_lats() {
        let r = ResampleLim::new(field(120, 3), LimConfig::new(), ResampleConfig::new()).unwrap();
        assert!(r.with_lats(Array1::zeros(2)).is_err());
    }

    #[test]
    fn default_monthly_run_shapes() {
        let config = LimConfig::new().with_n_modes(2);
        let r = ResampleLim::new(field(120, 3), config, ResampleConfig::new()).unwrap();
        let result = r.run(&ForecastOptions::new()).unwrap();
        assert_eq!(result.forecasts().dim(), (10, 1, 2, 12));
        assert_eq!(result.eofs().dim(), (10, 3, 2));
        assert_eq!(result.anomaly_series().dim(), (96, 3));
        assert_eq!(result.start_indices()[9], 72);
    }
}
