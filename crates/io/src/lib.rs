//! # lim-io
//!
//! NetCDF input and output for LIM forecasting: reading a gridded field into
//! a clean time x space matrix, persisting cross-validation results, and a
//! chunked file-backed [`lim_preprocess::Storage`] for out-of-core staging.

mod container;
mod error;
mod forecast_out;
mod netcdf_read;
mod netcdf_write;
mod reader;
mod storage;

pub use container::{read_container, write_container};
pub use error::IoError;
pub use forecast_out::write_forecast;
pub use reader::{FieldData, ReaderConfig, read_field};
pub use storage::NetcdfStorage;
