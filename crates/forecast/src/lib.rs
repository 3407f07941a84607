//! # lim-forecast
//!
//! Linear inverse model (LIM) forecasting in a truncated EOF basis.
//!
//! A [`Lim`] holds a raw calibration matrix and derives, on every forecast,
//! the smoothed anomaly series, its EOF basis and a propagator relating the
//! state at `t` to the state at `t + tau`. Forecasts at several lead times
//! come either from one lag-1 propagator raised to integer powers
//! ([`FitMode::Lag1Power`]) or from a separate fit per lag
//! ([`FitMode::Direct`]).

mod config;
mod error;
mod lim;
mod propagator;
mod result;

pub use config::{FitMode, ForecastOptions, LimConfig};
pub use error::LimError;
pub use lim::Lim;
pub use propagator::Propagator;
pub use result::Forecast;
