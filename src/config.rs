use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level `lim.toml` configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LimToml {
    /// File locations and field variable names.
    #[serde(default)]
    pub io: IoToml,

    /// Model settings shared by every subcommand.
    #[serde(default)]
    pub model: ModelToml,

    /// Cross-validation settings.
    #[serde(default)]
    pub resample: ResampleToml,

    /// Skill scoring settings.
    #[serde(default)]
    pub skill: SkillToml,

    /// Staging backend for smoothing.
    #[serde(default)]
    pub storage: StorageToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    /// Calibration field.
    pub input: Option<PathBuf>,
    /// Field to forecast from; defaults to `input`.
    pub initial: Option<PathBuf>,
    #[serde(default = "default_forecast_output")]
    pub forecast_output: PathBuf,
    #[serde(default = "default_results")]
    pub results: PathBuf,
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default = "default_var_name")]
    pub var_name: String,
    #[serde(default = "default_lat_aliases")]
    pub lat_aliases: Vec<String>,
    #[serde(default = "default_lon_aliases")]
    pub lon_aliases: Vec<String>,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            input: None,
            initial: None,
            forecast_output: default_forecast_output(),
            results: default_results(),
            report: default_report(),
            var_name: default_var_name(),
            lat_aliases: default_lat_aliases(),
            lon_aliases: default_lon_aliases(),
        }
    }
}

fn default_forecast_output() -> PathBuf {
    PathBuf::from("forecast.nc")
}
fn default_results() -> PathBuf {
    PathBuf::from("resample.nc")
}
fn default_report() -> PathBuf {
    PathBuf::from("skill.json")
}
fn default_var_name() -> String {
    "sst".to_string()
}
fn default_lat_aliases() -> Vec<String> {
    vec!["lat".into(), "latitude".into(), "y".into()]
}
fn default_lon_aliases() -> Vec<String> {
    vec!["lon".into(), "longitude".into(), "x".into()]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default = "default_twelve")]
    pub window_size: usize,
    #[serde(default = "default_twelve")]
    pub year_length: usize,
    #[serde(default = "default_lead_times")]
    pub lead_times: Vec<u32>,
    #[serde(default = "default_n_modes")]
    pub n_modes: usize,
    #[serde(default = "default_fit_mode")]
    pub fit_mode: String,
    #[serde(default)]
    pub detrend: bool,
    #[serde(default = "default_true")]
    pub area_weight: bool,
}

impl Default for ModelToml {
    fn default() -> Self {
        Self {
            window_size: default_twelve(),
            year_length: default_twelve(),
            lead_times: default_lead_times(),
            n_modes: default_n_modes(),
            fit_mode: default_fit_mode(),
            detrend: false,
            area_weight: true,
        }
    }
}

fn default_twelve() -> usize {
    12
}
fn default_lead_times() -> Vec<u32> {
    vec![1]
}
fn default_n_modes() -> usize {
    10
}
fn default_fit_mode() -> String {
    "lag1_power".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleToml {
    #[serde(default = "default_n_trials")]
    pub n_trials: usize,
    #[serde(default = "default_holdout_pct")]
    pub holdout_pct: f64,
}

impl Default for ResampleToml {
    fn default() -> Self {
        Self {
            n_trials: default_n_trials(),
            holdout_pct: default_holdout_pct(),
        }
    }
}

fn default_n_trials() -> usize {
    10
}
fn default_holdout_pct() -> f64 {
    0.1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillToml {
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default = "default_fisher_threshold")]
    pub fisher_threshold: f64,
}

impl Default for SkillToml {
    fn default() -> Self {
        Self {
            sigma: default_sigma(),
            fisher_threshold: default_fisher_threshold(),
        }
    }
}

fn default_sigma() -> f64 {
    2.0
}
fn default_fisher_threshold() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageToml {
    /// `"memory"` or `"netcdf"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Parent of the `netcdf` backend's scratch directory; the system
    /// temporary directory when unset. Removed when the run ends.
    pub scratch_dir: Option<PathBuf>,
    #[serde(default = "default_chunk_rows")]
    pub chunk_rows: usize,
    /// Staging budget in MiB; unlimited when unset.
    pub cache_mb: Option<usize>,
}

impl Default for StorageToml {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            scratch_dir: None,
            chunk_rows: default_chunk_rows(),
            cache_mb: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}
fn default_chunk_rows() -> usize {
    256
}

/// Reads and parses a TOML configuration file.
pub fn load(path: &Path) -> Result<LimToml> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}
