//! Low-level NetCDF writing helpers.

use crate::error::IoError;

/// Adds a fixed-size dimension. NetCDF treats a zero length as unlimited,
/// so empty dimensions are rejected.
pub(crate) fn add_dimension(file: &mut netcdf::FileMut, name: &str, len: usize) -> Result<(), IoError> {
    if len == 0 {
        return Err(IoError::Validation {
            count: 1,
            details: format!("dimension '{name}' would be empty"),
        });
    }
    file.add_dimension(name, len)?;
    Ok(())
}

/// Adds an `f64` variable over `dims` and writes `values` in row-major order.
pub(crate) fn put_f64<'a>(
    file: &mut netcdf::FileMut,
    name: &str,
    dims: &[&str],
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<(), IoError> {
    let data: Vec<f64> = values.into_iter().copied().collect();
    let mut var = file.add_variable::<f64>(name, dims)?;
    var.put_values(&data, ..)?;
    Ok(())
}

/// Adds an `i64` variable over a single dimension.
pub(crate) fn put_indices(
    file: &mut netcdf::FileMut,
    name: &str,
    dim: &str,
    values: impl IntoIterator<Item = usize>,
) -> Result<(), IoError> {
    let data = values
        .into_iter()
        .map(to_i64)
        .collect::<Result<Vec<i64>, IoError>>()?;
    let mut var = file.add_variable::<i64>(name, &[dim])?;
    var.put_values(&data, ..)?;
    Ok(())
}

pub(crate) fn to_i64(v: usize) -> Result<i64, IoError> {
    i64::try_from(v).map_err(|_| IoError::Validation {
        count: 1,
        details: format!("value {v} does not fit in a 64-bit signed integer"),
    })
}
