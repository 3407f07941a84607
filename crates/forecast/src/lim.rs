//! LIM calibration and forecast engine.

use lim_preprocess::{
    EdgeTrim, MemoryStorage, PreprocessError, Stage, StageRecord, StagingCache, Storage, TrimEdges,
    area_weight, calc_anomaly, calc_eofs, detrend, running_mean_staged,
};
use ndarray::{Array1, Array2, Array3, ArrayView2, s};
use tracing::{debug, info};

use crate::config::{FitMode, ForecastOptions, LimConfig};
use crate::error::LimError;
use crate::propagator::Propagator;
use crate::result::Forecast;

/// Linear inverse model over a calibration dataset.
///
/// Construction stores only the raw inputs. Every forecast re-derives the
/// smoothed anomalies, climatology, EOF basis and propagators from them.
///
/// # Example
///
/// ```
/// use lim_forecast::{ForecastOptions, Lim, LimConfig};
/// use ndarray::Array2;
///
/// let calib = Array2::from_shape_fn((120, 4), |(t, j)| {
///     ((t as f64) * 0.13 + j as f64).sin() + 0.1 * ((t * 7 + j) % 5) as f64
/// });
/// let config = LimConfig::new().with_n_modes(2).with_lead_times(vec![1, 2]);
/// let lim = Lim::new(calib.clone(), config).unwrap();
/// let fcast = lim.forecast(calib.view(), &ForecastOptions::new()).unwrap();
/// assert_eq!(fcast.tensor().dim(), (2, 2, 96));
/// ```
#[derive(Debug, Clone)]
pub struct Lim {
    calibration: Array2<f64>,
    config: LimConfig,
    lats: Option<Array1<f64>>,
    climatology: Option<Array2<f64>>,
}

impl Lim {
    /// Creates a model over a time x space calibration matrix.
    ///
    /// # Errors
    ///
    /// Returns [`LimError::InvalidConfig`] if `config` is invalid, or
    /// [`PreprocessError::NonFiniteInput`] if the calibration contains NaN
    /// or infinity.
    pub fn new(calibration: Array2<f64>, config: LimConfig) -> Result<Self, LimError> {
        config.validate()?;
        check_finite(calibration.view(), "calibration")?;
        Ok(Self {
            calibration,
            config,
            lats: None,
            climatology: None,
        })
    }

    /// Area-weights the EOF decomposition by these latitudes (degrees).
    ///
    /// # Errors
    ///
    /// Returns a shape error if there is not one latitude per column.
    pub fn with_lats(mut self, lats: Array1<f64>) -> Result<Self, LimError> {
        if lats.len() != self.calibration.ncols() {
            return Err(PreprocessError::Shape {
                context: "latitude vector",
                expected: self.calibration.ncols(),
                got: lats.len(),
            }
            .into());
        }
        self.lats = Some(lats);
        Ok(self)
    }

    /// Uses an externally supplied `(year_length x space)` climatology
    /// instead of deriving one from the calibration data.
    pub fn with_climatology(mut self, climatology: Array2<f64>) -> Self {
        self.climatology = Some(climatology);
        self
    }

    /// Replaces the calibration data. Takes effect on the next forecast.
    ///
    /// # Errors
    ///
    /// Returns an error if the new data has a different number of columns or
    /// contains non-finite values.
    pub fn set_calibration(&mut self, calibration: Array2<f64>) -> Result<(), LimError> {
        if calibration.ncols() != self.calibration.ncols() {
            return Err(LimError::SpaceMismatch {
                calibration: self.calibration.ncols(),
                initial: calibration.ncols(),
            });
        }
        check_finite(calibration.view(), "calibration")?;
        self.calibration = calibration;
        Ok(())
    }

    /// Returns the raw calibration matrix.
    pub fn calibration(&self) -> &Array2<f64> {
        &self.calibration
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LimConfig {
        &self.config
    }

    /// Returns the weighting latitudes, if set.
    pub fn lats(&self) -> Option<&Array1<f64>> {
        self.lats.as_ref()
    }

    /// Returns the supplied climatology, if any.
    pub fn climatology(&self) -> Option<&Array2<f64>> {
        self.climatology.as_ref()
    }

    /// Forecasts from `initial` using in-memory staging.
    ///
    /// See [`Lim::forecast_with_storage`].
    pub fn forecast(
        &self,
        initial: ArrayView2<'_, f64>,
        options: &ForecastOptions,
    ) -> Result<Forecast, LimError> {
        let mut storage = MemoryStorage::new();
        let mut cache = StagingCache::unbounded();
        self.forecast_with_storage(initial, options, &mut storage, &mut cache)
    }

    /// Forecasts from a raw time x space `initial` matrix.
    ///
    /// 1. The calibration data is smoothed (edges shaved to whole years) and
    ///    its anomaly and climatology derived.
    /// 2. `initial` is smoothed and anomalised against that climatology.
    /// 3. With `detrend`, the calibration anomalies are detrended. The
    ///    initial state is never detrended.
    /// 4. EOFs are computed from the calibration anomalies, area-weighted
    ///    when latitudes are set. The unweighted calibration anomalies and
    ///    the initial state are projected into the basis.
    /// 5. Propagators are fitted per [`FitMode`] and applied to the initial
    ///    state, giving a `(leads x modes x samples)` tensor.
    ///
    /// # Errors
    ///
    /// - [`LimError::SpaceMismatch`] if `initial` has a different number of
    ///   columns than the calibration.
    /// - [`LimError::InsufficientData`] if no training pairs remain after
    ///   removing the largest lag.
    /// - [`LimError::Preprocess`] for window, year, mode-count or singular
    ///   matrix failures.
    #[tracing::instrument(skip_all, fields(
        n_modes = self.config.n_modes(),
        window = self.config.window_size(),
        fit_mode = ?options.fit_mode(),
    ))]
    pub fn forecast_with_storage<S: Storage>(
        &self,
        initial: ArrayView2<'_, f64>,
        options: &ForecastOptions,
        storage: &mut S,
        cache: &mut StagingCache,
    ) -> Result<Forecast, LimError> {
        let n_space = self.calibration.ncols();
        if initial.ncols() != n_space {
            return Err(LimError::SpaceMismatch {
                calibration: n_space,
                initial: initial.ncols(),
            });
        }
        check_finite(initial, "initial data")?;
        let year_len = self.config.year_length();

        // Calibration anomalies and climatology.
        let (calib_smoothed, calib_edges) = self.smooth(self.calibration.view(), storage, cache)?;
        let (anomaly, climatology) = calc_anomaly(
            calib_smoothed.view(),
            year_len,
            self.climatology.as_ref().map(|c| c.view()),
        )?
        .into_parts();
        let mut calib_record = StageRecord::new()
            .then_trimmed(Stage::RunningMean, calib_edges)
            .then(Stage::Anomaly);

        // Initial state against the same climatology.
        let (init_smoothed, init_edges) = self.smooth(initial, storage, cache)?;
        let (init_anomaly, _) =
            calc_anomaly(init_smoothed.view(), year_len, Some(climatology.view()))?.into_parts();
        let initial_record = StageRecord::new()
            .then_trimmed(Stage::RunningMean, init_edges)
            .then(Stage::Anomaly)
            .then(Stage::EofProjected);

        let tdim = self.training_span(anomaly.nrows(), options.fit_mode())?;

        let train_anomaly = if options.detrend() {
            calib_record = calib_record.then(Stage::Detrended);
            detrend(anomaly.view())
        } else {
            anomaly
        };

        let eofs = match &self.lats {
            Some(lats) => {
                calib_record = calib_record.then(Stage::AreaWeighted);
                let weighted = area_weight(train_anomaly.view(), lats.view())?;
                calc_eofs(weighted.t(), self.config.n_modes())?
            }
            None => calc_eofs(train_anomaly.t(), self.config.n_modes())?,
        };
        calib_record = calib_record.then(Stage::EofProjected);
        debug!(
            var_explained = eofs.var_explained(),
            n_train = train_anomaly.nrows(),
            "calibration EOFs"
        );

        let train = eofs.project(train_anomaly.view())?;
        let state = eofs.project(init_anomaly.view())?;

        let (propagators, base) = match options.fit_mode() {
            FitMode::Lag1Power => {
                let base = self.fit_lag1(train.view(), tdim)?;
                let props: Vec<Propagator> = self
                    .config
                    .lead_times()
                    .iter()
                    .map(|&lead| base.power(lead))
                    .collect();
                (props, Some(base))
            }
            FitMode::Direct => (self.fit_direct(train.view(), tdim)?, None),
        };

        let n_samples = state.ncols();
        let mut tensor = Array3::zeros((propagators.len(), self.config.n_modes(), n_samples));
        for (mut slab, g) in tensor.outer_iter_mut().zip(&propagators) {
            slab.assign(&g.apply(state.view())?);
        }

        info!(
            n_leads = propagators.len(),
            n_samples,
            var_explained = eofs.var_explained(),
            "forecast complete"
        );

        Ok(Forecast::new(
            tensor,
            eofs,
            climatology,
            state,
            self.config.lead_times().to_vec(),
            propagators,
            base,
            calib_record,
            initial_record,
        ))
    }

    /// Running mean with edges shaved to whole years, staged through `storage`.
    fn smooth<S: Storage>(
        &self,
        data: ArrayView2<'_, f64>,
        storage: &mut S,
        cache: &mut StagingCache,
    ) -> Result<(Array2<f64>, TrimEdges), LimError> {
        let input = storage.store(data)?;
        let (output, edges) = running_mean_staged(
            storage,
            input,
            self.config.window_size(),
            EdgeTrim::WholeYears(self.config.year_length()),
            cache,
        )?;
        let smoothed = storage.read(output)?;
        storage.release(input)?;
        storage.release(output)?;
        Ok((smoothed, edges))
    }

    /// Number of `x0` samples left after removing the fit lag from `n`
    /// training samples. Lag-1 mode removes one window, direct mode the
    /// largest lead's lag.
    fn training_span(&self, n: usize, fit_mode: FitMode) -> Result<usize, LimError> {
        let (lag, context) = match fit_mode {
            FitMode::Lag1Power => (self.config.window_size(), "lag-1 training pairs"),
            FitMode::Direct => (
                self.config.lag_of(self.config.max_lead()),
                "direct-fit training pairs",
            ),
        };
        if n <= lag {
            return Err(LimError::InsufficientData {
                context,
                available: n,
                required: lag + 1,
            });
        }
        Ok(n - lag)
    }

    /// One propagator at a lag of one window, from all contiguous pairs.
    fn fit_lag1(&self, train: ArrayView2<'_, f64>, tdim: usize) -> Result<Propagator, LimError> {
        let tau = self.config.window_size();
        Propagator::fit(
            train.slice(s![.., ..tdim]),
            train.slice(s![.., tau..tau + tdim]),
            tau,
        )
    }

    /// One propagator per lead, all sharing the `x0` span left by the
    /// largest lag.
    fn fit_direct(
        &self,
        train: ArrayView2<'_, f64>,
        tdim: usize,
    ) -> Result<Vec<Propagator>, LimError> {
        let x0 = train.slice(s![.., ..tdim]);
        self.config
            .lead_times()
            .iter()
            .map(|&lead| {
                let lag = self.config.lag_of(lead);
                Propagator::fit(x0, train.slice(s![.., lag..lag + tdim]), lag)
            })
            .collect()
    }
}

fn check_finite(data: ArrayView2<'_, f64>, field: &'static str) -> Result<(), LimError> {
    if data.iter().any(|v| !v.is_finite()) {
        return Err(PreprocessError::NonFiniteInput { field }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn field(n: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, cols), |(t, j)| {
            (t as f64 * 0.21 + j as f64).sin() + 0.3 * (t as f64 * 0.05 * (j + 1) as f64).cos()
        })
    }

    #[test]
    fn rejects_space_mismatch() {
        let lim = Lim::new(field(120, 4), LimConfig::new().with_n_modes(2)).unwrap();
        let initial = field(120, 3);
        assert!(matches!(
            lim.forecast(initial.view(), &ForecastOptions::new()),
            Err(LimError::SpaceMismatch {
                calibration: 4,
                initial: 3
            })
        ));
    }

    #[test]
    fn rejects_non_finite_calibration() {
        let mut data = field(120, 4);
        data[[5, 1]] = f64::NAN;
        assert!(matches!(
            Lim::new(data, LimConfig::new()),
            Err(LimError::Preprocess(PreprocessError::NonFiniteInput { .. }))
        ));
    }

    #[test]
    fn rejects_bad_lats() {
        let lim = Lim::new(field(120, 4), LimConfig::new()).unwrap();
        assert!(lim.with_lats(Array1::zeros(3)).is_err());
    }

    #[test]
    fn lag1_needs_more_than_one_window() {
        // 36 rows shave to 12: no lag-12 pairs remain.
        let data = field(36, 4);
        let lim = Lim::new(data.clone(), LimConfig::new().with_n_modes(2)).unwrap();
        assert!(matches!(
            lim.forecast(data.view(), &ForecastOptions::new()),
            Err(LimError::InsufficientData {
                available: 12,
                required: 13,
                ..
            })
        ));
    }

    #[test]
    fn direct_needs_more_than_max_lag() {
        let data = field(72, 4);
        let config = LimConfig::new().with_n_modes(2).with_lead_times(vec![1, 4]);
        let lim = Lim::new(data.clone(), config).unwrap();
        let opts = ForecastOptions::new().with_fit_mode(FitMode::Direct);
        assert!(matches!(
            lim.forecast(data.view(), &opts),
            Err(LimError::InsufficientData {
                available: 48,
                required: 49,
                ..
            })
        ));
    }

    #[test]
    fn stage_records() {
        let data = field(120, 4);
        let lim = Lim::new(data.clone(), LimConfig::new().with_n_modes(2))
            .unwrap()
            .with_lats(Array1::from(vec![0.0, 20.0, 40.0, 60.0]))
            .unwrap();
        let opts = ForecastOptions::new().with_detrend(true);
        let fcast = lim.forecast(data.view(), &opts).unwrap();

        let calib = fcast.calibration_record();
        assert!(calib.contains(Stage::Detrended));
        assert!(calib.contains(Stage::AreaWeighted));
        assert_eq!(calib.current(), Stage::EofProjected);
        assert_eq!(calib.edges(), TrimEdges::new(12, 12));

        let init = fcast.initial_record();
        assert!(!init.contains(Stage::Detrended));
        assert!(!init.contains(Stage::AreaWeighted));
    }

    #[test]
    fn staged_cache_does_not_change_result() {
        let data = field(120, 4);
        let lim = Lim::new(data.clone(), LimConfig::new().with_n_modes(2)).unwrap();
        let opts = ForecastOptions::new();
        let a = lim.forecast(data.view(), &opts).unwrap();

        let mut storage = MemoryStorage::new();
        let mut cache = StagingCache::new(8 * 4 * 20);
        let b = lim
            .forecast_with_storage(data.view(), &opts, &mut storage, &mut cache)
            .unwrap();
        assert_eq!(storage.n_live(), 0);
        assert_abs_diff_eq!(a.tensor(), b.tensor(), epsilon = 1e-12);
    }
}
