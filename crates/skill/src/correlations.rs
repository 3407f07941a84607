//! Local anomaly correlation and its significance.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::config::SkillConfig;
use crate::error::SkillError;

/// Outcome of the significance test at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
    /// The test could not be applied: the correlation is undefined, or it
    /// needs the Fisher transform with `n_eff <= 3`.
    Undetermined,
}

/// Per-location correlation skill.
#[derive(Debug, Clone)]
pub struct CorrelationSkill {
    /// Pearson correlation per location; NaN where undefined.
    pub correlation: Array1<f64>,
    /// Effective sample size per location.
    pub n_eff: Array1<f64>,
    /// Two-sided normal p-value of the tested statistic; NaN when
    /// undetermined.
    pub p_value: Array1<f64>,
    /// Per-location verdict.
    pub significance: Vec<Significance>,
}

impl CorrelationSkill {
    /// Number of locations scored.
    pub fn n_locations(&self) -> usize {
        self.correlation.len()
    }

    /// Locations with a significant correlation.
    pub fn n_significant(&self) -> usize {
        self.count(Significance::Significant)
    }

    /// Locations whose significance could not be tested.
    pub fn n_undetermined(&self) -> usize {
        self.count(Significance::Undetermined)
    }

    fn count(&self, which: Significance) -> usize {
        self.significance.iter().filter(|&&s| s == which).count()
    }
}

pub(crate) fn check_same_shape(
    fcast: ArrayView2<'_, f64>,
    obs: ArrayView2<'_, f64>,
) -> Result<(), SkillError> {
    if fcast.nrows() != obs.nrows() {
        return Err(SkillError::Shape {
            context: "forecast and observation samples",
            expected: obs.nrows(),
            got: fcast.nrows(),
        });
    }
    if fcast.ncols() != obs.ncols() {
        return Err(SkillError::Shape {
            context: "forecast and observation locations",
            expected: obs.ncols(),
            got: fcast.ncols(),
        });
    }
    Ok(())
}

fn column(v: ArrayView1<'_, f64>) -> Vec<f64> {
    v.iter().copied().collect()
}

/// Pearson correlation between forecast and observation at each location
/// (column), across samples (rows). Undefined correlations are NaN.
pub fn anomaly_correlation(
    fcast: ArrayView2<'_, f64>,
    obs: ArrayView2<'_, f64>,
) -> Result<Array1<f64>, SkillError> {
    check_same_shape(fcast, obs)?;
    Ok(fcast
        .columns()
        .into_iter()
        .zip(obs.columns())
        .map(|(f, o)| {
            lim_stats::pearson_correlation(&column(f), &column(o)).unwrap_or(f64::NAN)
        })
        .collect())
}

/// Effective sample size at each location, discounting the lag-1
/// autocorrelation of both series.
pub fn effective_sample_size(
    fcast: ArrayView2<'_, f64>,
    obs: ArrayView2<'_, f64>,
) -> Result<Array1<f64>, SkillError> {
    check_same_shape(fcast, obs)?;
    let n = fcast.nrows();
    Ok(fcast
        .columns()
        .into_iter()
        .zip(obs.columns())
        .map(|(f, o)| {
            let r1f = lim_stats::lag1_autocorrelation(&column(f)).unwrap_or(0.0);
            let r1o = lim_stats::lag1_autocorrelation(&column(o)).unwrap_or(0.0);
            lim_stats::effective_sample_size(n, r1f, r1o)
        })
        .collect())
}

/// Correlation with a significance flag at each location.
///
/// Below the Fisher threshold the statistic is `|r|` and the threshold
/// `sigma / sqrt(n_eff)`. At or above it the statistic is
/// `|0.5 ln((1 + r) / (1 - r))|` and the threshold `sigma / sqrt(n_eff - 3)`.
/// A location is significant when the statistic exceeds the threshold.
/// Locations needing the Fisher test with `n_eff <= 3` are reported as
/// [`Significance::Undetermined`].
pub fn calc_corr_signif(
    fcast: ArrayView2<'_, f64>,
    obs: ArrayView2<'_, f64>,
    config: &SkillConfig,
) -> Result<CorrelationSkill, SkillError> {
    config.validate()?;
    let correlation = anomaly_correlation(fcast, obs)?;
    let n_eff = effective_sample_size(fcast, obs)?;
    let normal = Normal::new(0.0, 1.0).map_err(|e| SkillError::Distribution {
        reason: e.to_string(),
    })?;

    let n = correlation.len();
    let mut p_value = Array1::from_elem(n, f64::NAN);
    let mut significance = vec![Significance::Undetermined; n];
    let mut n_degenerate = 0usize;

    for (i, (&r, &ne)) in correlation.iter().zip(n_eff.iter()).enumerate() {
        if !r.is_finite() {
            continue;
        }
        let (stat, dof) = if r.abs() < config.fisher_threshold() {
            (r.abs(), ne)
        } else {
            if ne <= 3.0 {
                n_degenerate += 1;
                continue;
            }
            let r = r.clamp(-1.0, 1.0);
            let z = 0.5 * ((1.0 + r) / (1.0 - r)).ln();
            (z.abs(), ne - 3.0)
        };
        let threshold = config.sigma() / dof.sqrt();
        significance[i] = if stat - threshold > 0.0 {
            Significance::Significant
        } else {
            Significance::NotSignificant
        };
        p_value[i] = 2.0 * (1.0 - normal.cdf(stat * dof.sqrt()));
    }

    if n_degenerate > 0 {
        warn!(
            n_degenerate,
            "high correlations with n_eff <= 3 left undetermined"
        );
    }

    Ok(CorrelationSkill {
        correlation,
        n_eff,
        p_value,
        significance,
    })
}
