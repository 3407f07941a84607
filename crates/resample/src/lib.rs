//! # lim-resample
//!
//! Cross-validation for the linear inverse model.
//!
//! A [`TrialPlan`] places held-out chunks evenly along an observation
//! series. For each chunk, [`ResampleLim`] calibrates a fresh
//! [`Lim`](lim_forecast::Lim) on the remaining observations and forecasts
//! from the chunk. The per-trial forecasts and EOFs are stacked into a
//! [`ResampleResult`] alongside the anomalies of the whole series.
//!
//! ```text
//!  observations ──▶ TrialPlan ──▶ per trial: split ─▶ Lim::forecast ──▶ ResampleResult
//!        │                                                                   ▲
//!        └──────────── running mean + anomaly (own climatology) ─────────────┘
//! ```
//!
//! # Quick start
//!
//! ```
//! use lim_forecast::{ForecastOptions, LimConfig};
//! use lim_resample::{ResampleConfig, ResampleLim};
//! use ndarray::Array2;
//!
//! let obs = Array2::from_shape_fn((120, 3), |(t, j)| {
//!     (t as f64 * 0.37 + j as f64).sin() + 0.2 * ((t * 5 + j) % 7) as f64
//! });
//! let lim_config = LimConfig::new().with_n_modes(2);
//! let driver = ResampleLim::new(obs, lim_config, ResampleConfig::new()).unwrap();
//! let result = driver.run(&ForecastOptions::new()).unwrap();
//! assert_eq!(result.n_trials(), 10);
//! ```

mod config;
mod error;
mod plan;
mod resample;
mod result;

pub use config::ResampleConfig;
pub use error::ResampleError;
pub use plan::{TrialPlan, unique_rounded_linspace};
pub use resample::ResampleLim;
pub use result::{ResampleParts, ResampleResult};
