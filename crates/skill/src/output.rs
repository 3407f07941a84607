//! JSON output structures for skill reports.

use serde::Serialize;

use crate::correlations::Significance;
use crate::error::SkillError;

/// Top-level skill report.
#[derive(Debug, Serialize)]
pub struct SkillReport {
    /// Run and test settings.
    pub config: ReportSummary,
    /// One entry per lead time, in request order.
    pub leads: Vec<LeadSkill>,
}

/// Summary of the run being scored.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub n_trials: usize,
    pub n_trials_requested: usize,
    pub start_indices: Vec<usize>,
    pub test_len: usize,
    pub window_size: usize,
    pub year_length: usize,
    pub n_space: usize,
    pub n_modes: usize,
    pub sigma: f64,
    pub fisher_threshold: f64,
    pub var_explained: Vec<f64>,
}

/// Skill at one lead time. Per-location vectors hold `null` where a value
/// is undefined.
#[derive(Debug, Clone, Serialize)]
pub struct LeadSkill {
    pub lead: u32,
    pub lag: usize,
    pub correlation: Vec<Option<f64>>,
    pub n_eff: Vec<f64>,
    pub p_value: Vec<Option<f64>>,
    pub significance: Vec<Significance>,
    pub ce: Vec<Option<f64>>,
    pub mean_correlation: Option<f64>,
    pub mean_ce: Option<f64>,
    pub n_significant: usize,
    pub n_undetermined: usize,
}

/// `Some(v)` for finite values.
pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Mean of the finite values, if any.
pub(crate) fn finite_mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Serialize a skill report to a pretty-printed JSON string.
pub fn to_json(report: &SkillReport) -> Result<String, SkillError> {
    serde_json::to_string_pretty(report).map_err(|e| SkillError::Serialization {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ReportSummary {
        ReportSummary {
            n_trials: 6,
            n_trials_requested: 10,
            start_indices: vec![0, 1, 2, 3, 4, 5],
            test_len: 12,
            window_size: 12,
            year_length: 12,
            n_space: 2,
            n_modes: 1,
            sigma: 2.0,
            fisher_threshold: 0.5,
            var_explained: vec![0.9; 6],
        }
    }

    #[test]
    fn test_to_json_roundtrip() {
        let report = SkillReport {
            config: summary(),
            leads: vec![LeadSkill {
                lead: 1,
                lag: 12,
                correlation: vec![Some(0.7), None],
                n_eff: vec![20.0, 1.0],
                p_value: vec![Some(0.001), None],
                significance: vec![Significance::Significant, Significance::Undetermined],
                ce: vec![Some(0.4), None],
                mean_correlation: Some(0.7),
                mean_ce: Some(0.4),
                n_significant: 1,
                n_undetermined: 1,
            }],
        };

        let json = to_json(&report).unwrap();
        assert!(json.contains("\"n_trials\": 6"));
        assert!(json.contains("\"n_trials_requested\": 10"));
        assert!(json.contains("\"significant\""));
        assert!(json.contains("\"undetermined\""));
        assert!(json.contains("null"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["leads"][0]["lag"], 12);
        assert_eq!(value["leads"][0]["correlation"][1], serde_json::Value::Null);
    }

    #[test]
    fn test_significance_serializes_snake_case() {
        let json = serde_json::to_string(&Significance::NotSignificant).unwrap();
        assert_eq!(json, "\"not_significant\"");
    }

    #[test]
    fn test_finite_helpers() {
        assert_eq!(finite(f64::NAN), None);
        assert_eq!(finite(0.5), Some(0.5));
        assert_eq!(finite_mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(finite_mean(&[f64::NAN]), None);
    }
}
