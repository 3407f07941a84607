//! Per-lead skill of a cross-validation run.

use lim_resample::ResampleResult;
use ndarray::Array2;
use tracing::{debug, info};

use crate::config::SkillConfig;
use crate::correlations::{CorrelationSkill, calc_corr_signif};
use crate::efficiency::coefficient_of_efficiency;
use crate::error::SkillError;
use crate::reconstruct::{assemble_observation_series, reconstruct_trial_physical};

fn lead_lag(result: &ResampleResult, lead_idx: usize) -> Result<usize, SkillError> {
    result.lag_for_lead(lead_idx).ok_or(SkillError::Shape {
        context: "lead index",
        expected: result.lead_times().len(),
        got: lead_idx,
    })
}

/// Correlation skill for each lead time, pooling all trials into one
/// series per location.
#[tracing::instrument(skip_all, fields(n_leads = result.lead_times().len(), n_trials = result.n_trials()))]
pub fn forecast_correlation(
    result: &ResampleResult,
    config: &SkillConfig,
) -> Result<Vec<CorrelationSkill>, SkillError> {
    let anomalies = result.anomaly_series().view();
    (0..result.lead_times().len())
        .map(|i| {
            let lag = lead_lag(result, i)?;
            let fcast = reconstruct_trial_physical(result.lead_forecasts(i), result.eofs().view())?;
            let obs = assemble_observation_series(
                anomalies,
                result.start_indices(),
                lag,
                result.test_len(),
            )?;
            let skill = calc_corr_signif(fcast.view(), obs.view(), config)?;
            debug!(
                lead = result.lead_times()[i],
                n_significant = skill.n_significant(),
                "correlation skill"
            );
            Ok(skill)
        })
        .collect()
}

/// Coefficient of efficiency, `(leads x space)`, averaged over trials.
///
/// Each trial is scored on its own observation window against the time
/// mean of the full anomaly series.
#[tracing::instrument(skip_all, fields(n_leads = result.lead_times().len(), n_trials = result.n_trials()))]
pub fn forecast_ce(result: &ResampleResult) -> Result<Array2<f64>, SkillError> {
    let anomalies = result.anomaly_series().view();
    let n_trials = result.n_trials();
    let mut ce = Array2::<f64>::zeros((result.lead_times().len(), result.n_space()));
    if n_trials == 0 {
        ce.fill(f64::NAN);
        return Ok(ce);
    }

    for (i, mut row) in ce.outer_iter_mut().enumerate() {
        let lag = lead_lag(result, i)?;
        for (j, (trial, eof)) in result
            .lead_forecasts(i)
            .outer_iter()
            .zip(result.eofs().outer_iter())
            .enumerate()
        {
            let fcast = trial.t().dot(&eof.t());
            let start = result.start_indices()[j];
            let obs = assemble_observation_series(anomalies, &[start], lag, result.test_len())?;
            row += &coefficient_of_efficiency(fcast.view(), obs.view(), anomalies)?;
        }
        row /= n_trials as f64;
        debug!(
            lead = result.lead_times()[i],
            mean_ce = row.mean().unwrap_or(f64::NAN),
            "coefficient of efficiency"
        );
    }

    info!(n_leads = ce.nrows(), n_space = ce.ncols(), "coefficient of efficiency complete");
    Ok(ce)
}
