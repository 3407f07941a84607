//! Writing a single LIM forecast to NetCDF.

use std::path::Path;

use lim_forecast::Forecast;
use tracing::info;

use crate::error::IoError;
use crate::netcdf_write::{add_dimension, put_f64, put_indices};
use crate::reader::FieldData;

/// Write an EOF-space forecast with the basis needed to map it back.
///
/// Variables: `fcast_times (lead)`, `forecast (lead, mode, sample)`,
/// `eofs (space, mode)`, `eigenvalues (mode)` and
/// `climatology (year_slot, space)`. With `field`, per-location `lat` and
/// `lon` are added so the output can be inflated back onto the grid.
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if `field` has a different number
/// of locations than the forecast, or [`IoError::Netcdf`] on write failure.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_forecast(
    path: &Path,
    forecast: &Forecast,
    field: Option<&FieldData>,
) -> Result<(), IoError> {
    let basis = forecast.eofs();
    let (n_leads, n_modes, n_samples) = forecast.tensor().dim();
    let n_space = basis.n_space();
    if let Some(f) = field
        && f.n_valid() != n_space
    {
        return Err(IoError::DimensionMismatch {
            name: "space".to_string(),
            expected: n_space,
            got: f.n_valid(),
        });
    }

    let mut file = netcdf::create(path)?;
    add_dimension(&mut file, "lead", n_leads)?;
    add_dimension(&mut file, "mode", n_modes)?;
    add_dimension(&mut file, "sample", n_samples)?;
    add_dimension(&mut file, "space", n_space)?;
    add_dimension(&mut file, "year_slot", forecast.climatology().nrows())?;

    put_indices(
        &mut file,
        "fcast_times",
        "lead",
        forecast.lead_times().iter().map(|&l| l as usize),
    )?;
    put_f64(&mut file, "forecast", &["lead", "mode", "sample"], forecast.tensor())?;
    put_f64(&mut file, "eofs", &["space", "mode"], basis.patterns())?;
    put_f64(&mut file, "eigenvalues", &["mode"], basis.eigenvalues())?;
    put_f64(
        &mut file,
        "climatology",
        &["year_slot", "space"],
        forecast.climatology(),
    )?;
    if let Some(f) = field {
        put_f64(&mut file, "lat", &["space"], f.lats())?;
        put_f64(&mut file, "lon", &["space"], f.lons())?;
    }

    info!(n_leads, n_modes, n_samples, n_space, "forecast written");
    Ok(())
}
