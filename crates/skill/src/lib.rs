//! # lim-skill
//!
//! Skill of cross-validated LIM forecasts: local anomaly correlation with a
//! significance test, and the coefficient of efficiency against the
//! observation climatology.
//!
//! Forecasts from a [`ResampleResult`] are mapped back to physical space
//! trial by trial and compared with the observation anomalies at the same
//! start indices shifted by each lead's lag.

mod config;
mod correlations;
mod efficiency;
mod error;
mod output;
mod reconstruct;
mod scoring;

use lim_resample::ResampleResult;

pub use config::SkillConfig;
pub use correlations::{
    CorrelationSkill, Significance, anomaly_correlation, calc_corr_signif, effective_sample_size,
};
pub use efficiency::coefficient_of_efficiency;
pub use error::SkillError;
pub use output::{LeadSkill, ReportSummary, SkillReport, to_json};
pub use reconstruct::{assemble_observation_series, reconstruct_trial_physical};
pub use scoring::{forecast_ce, forecast_correlation};

/// Scores every lead of a cross-validation run.
///
/// # Errors
///
/// Returns [`SkillError::InvalidConfig`] for a bad configuration, or a
/// shape or alignment error if the result's arrays do not line up.
pub fn evaluate(result: &ResampleResult, config: &SkillConfig) -> Result<SkillReport, SkillError> {
    config.validate()?;
    let correlations = forecast_correlation(result, config)?;
    let ce = forecast_ce(result)?;

    let leads = correlations
        .into_iter()
        .zip(ce.outer_iter())
        .enumerate()
        .map(|(i, (corr, ce_row))| LeadSkill {
            lead: result.lead_times()[i],
            lag: result.lag_for_lead(i).unwrap_or_default(),
            correlation: corr.correlation.iter().map(|&v| output::finite(v)).collect(),
            n_eff: corr.n_eff.to_vec(),
            p_value: corr.p_value.iter().map(|&v| output::finite(v)).collect(),
            significance: corr.significance.clone(),
            ce: ce_row.iter().map(|&v| output::finite(v)).collect(),
            mean_correlation: output::finite_mean(corr.correlation.iter()),
            mean_ce: output::finite_mean(ce_row.iter()),
            n_significant: corr.n_significant(),
            n_undetermined: corr.n_undetermined(),
        })
        .collect();

    Ok(SkillReport {
        config: ReportSummary {
            n_trials: result.n_trials(),
            n_trials_requested: result.n_trials_requested(),
            start_indices: result.start_indices().to_vec(),
            test_len: result.test_len(),
            window_size: result.window_size(),
            year_length: result.year_length(),
            n_space: result.n_space(),
            n_modes: result.n_modes(),
            sigma: config.sigma(),
            fisher_threshold: config.fisher_threshold(),
            var_explained: result.var_explained().to_vec(),
        },
        leads,
    })
}
