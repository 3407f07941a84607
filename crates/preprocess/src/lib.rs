//! # lim-preprocess
//!
//! Preprocessing chain for Linear Inverse Model forecasting: running-mean
//! smoothing, climatology removal, linear detrending, latitude area weighting
//! and truncated EOF decomposition of time x space matrices.
//!
//! Every transform is a pure function over `ndarray` views. Callers thread a
//! [`StageRecord`] alongside the arrays to track which stages were applied
//! and the trim edges in effect. Out-of-core execution goes through the
//! [`Storage`] capability with an explicitly sized [`StagingCache`].

mod anomaly;
mod area_weight;
mod detrend;
mod eof;
mod error;
pub mod linalg;
mod running_mean;
mod stage;
mod storage;

pub use anomaly::{Anomaly, calc_anomaly};
pub use area_weight::{area_weight, area_weights};
pub use detrend::detrend;
pub use eof::{EofBasis, calc_eofs};
pub use error::PreprocessError;
pub use running_mean::{EdgeTrim, Smoothed, TrimEdges, running_mean, running_mean_staged, trim_edges};
pub use stage::{Stage, StageRecord};
pub use storage::{ArrayHandle, MemoryStorage, StagingCache, Storage, check_block, check_rows};
