//! Persisted cross-validation results.
//!
//! A container is a single NetCDF file:
//!
//! | variable            | dimensions                      |
//! |---------------------|---------------------------------|
//! | `anomaly_srs`       | `(anom_time, space)`            |
//! | `test_start_idxs`   | `(trial)`                       |
//! | `fcast_times`       | `(lead)`                        |
//! | `eofs`              | `(trial, space, mode)`          |
//! | `var_explained`     | `(trial)`                       |
//! | `fcast_bin_<k>`     | `(trial, mode, test_time)`      |
//!
//! `anomaly_srs` carries the integer attributes `yrsize`, `test_tdim`,
//! `wsize` and `n_trials_requested`.

use std::path::Path;

use lim_resample::{ResampleParts, ResampleResult};
use ndarray::{Array1, Array3, Array4, Axis};
use tracing::{debug, info};

use crate::error::IoError;
use crate::netcdf_read;
use crate::netcdf_write::{add_dimension, put_f64, put_indices, to_i64};

const ANOMALY_VAR: &str = "anomaly_srs";

fn fcast_bin(lead_idx: usize) -> String {
    format!("fcast_bin_{lead_idx}")
}

/// Write a cross-validation result to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`IoError::Netcdf`] on library failures, or
/// [`IoError::Validation`] if any dimension of the result is empty.
#[tracing::instrument(skip_all, fields(path = %path.display(), n_trials = result.n_trials()))]
pub fn write_container(path: &Path, result: &ResampleResult) -> Result<(), IoError> {
    let mut file = netcdf::create(path)?;

    let (n_anom, n_space) = result.anomaly_series().dim();
    add_dimension(&mut file, "anom_time", n_anom)?;
    add_dimension(&mut file, "space", n_space)?;
    add_dimension(&mut file, "trial", result.n_trials())?;
    add_dimension(&mut file, "lead", result.lead_times().len())?;
    add_dimension(&mut file, "mode", result.n_modes())?;
    add_dimension(&mut file, "test_time", result.test_len())?;

    put_f64(&mut file, ANOMALY_VAR, &["anom_time", "space"], result.anomaly_series())?;
    {
        let mut var = file
            .variable_mut(ANOMALY_VAR)
            .ok_or_else(|| IoError::Netcdf {
                reason: format!("variable '{ANOMALY_VAR}' vanished after creation"),
            })?;
        var.put_attribute("yrsize", to_i64(result.year_length())?)?;
        var.put_attribute("test_tdim", to_i64(result.test_len())?)?;
        var.put_attribute("wsize", to_i64(result.window_size())?)?;
        var.put_attribute("n_trials_requested", to_i64(result.n_trials_requested())?)?;
    }

    put_indices(
        &mut file,
        "test_start_idxs",
        "trial",
        result.start_indices().iter().copied(),
    )?;
    put_indices(
        &mut file,
        "fcast_times",
        "lead",
        result.lead_times().iter().map(|&l| l as usize),
    )?;
    put_f64(&mut file, "eofs", &["trial", "space", "mode"], result.eofs())?;
    put_f64(&mut file, "var_explained", &["trial"], result.var_explained())?;

    for k in 0..result.lead_times().len() {
        put_f64(
            &mut file,
            &fcast_bin(k),
            &["trial", "mode", "test_time"],
            result.lead_forecasts(k),
        )?;
    }

    info!(
        n_leads = result.lead_times().len(),
        n_space,
        "results container written"
    );
    Ok(())
}

/// Read a cross-validation result written by [`write_container`].
///
/// # Errors
///
/// Returns [`IoError::MissingVariable`] or [`IoError::MissingAttribute`] for
/// incomplete files, [`IoError::DimensionMismatch`] when a per-lead
/// forecast block disagrees with the other arrays, and
/// [`IoError::Resample`] if the decoded parts are inconsistent.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_container(path: &Path) -> Result<ResampleResult, IoError> {
    let file = netcdf_read::open_file(path)?;

    let anomaly_var = netcdf_read::variable(&file, ANOMALY_VAR, path)?;
    let year_length = netcdf_read::usize_attribute(&anomaly_var, "yrsize")?;
    let test_len = netcdf_read::usize_attribute(&anomaly_var, "test_tdim")?;
    let window_size = netcdf_read::usize_attribute(&anomaly_var, "wsize")?;
    let n_trials_requested = netcdf_read::usize_attribute(&anomaly_var, "n_trials_requested")?;

    let (anom, anom_shape) = netcdf_read::read_nd_f64::<2>(&file, ANOMALY_VAR, path)?;
    let anomaly_series = to_array(anom, anom_shape)?;

    let start_indices = netcdf_read::read_indices(&file, "test_start_idxs", path)?;
    let lead_times = netcdf_read::read_indices(&file, "fcast_times", path)?
        .into_iter()
        .map(|l| {
            u32::try_from(l).map_err(|_| IoError::Validation {
                count: 1,
                details: format!("lead time {l} out of range"),
            })
        })
        .collect::<Result<Vec<u32>, IoError>>()?;

    let (eof_data, eof_shape) = netcdf_read::read_nd_f64::<3>(&file, "eofs", path)?;
    let eofs = to_array(eof_data, eof_shape)?;
    let var_explained = Array1::from(netcdf_read::read_1d_f64(&file, &["var_explained"], path)?);

    let (n_trials, _, n_modes) = eofs.dim();
    let mut forecasts = Array4::<f64>::zeros((n_trials, lead_times.len(), n_modes, test_len));
    for (k, mut slab) in forecasts.axis_iter_mut(Axis(1)).enumerate() {
        let name = fcast_bin(k);
        let (data, shape) = netcdf_read::read_nd_f64::<3>(&file, &name, path)?;
        let expected = [n_trials, n_modes, test_len];
        if let Some(i) = (0..3).find(|&i| shape[i] != expected[i]) {
            return Err(IoError::DimensionMismatch {
                name: format!("{name} axis {i}"),
                expected: expected[i],
                got: shape[i],
            });
        }
        let block: Array3<f64> = to_array(data, shape)?;
        slab.assign(&block);
    }
    debug!(n_trials, n_leads = lead_times.len(), "container decoded");

    let result = ResampleResult::from_parts(ResampleParts {
        forecasts,
        eofs,
        start_indices,
        n_trials_requested,
        test_len,
        lead_times,
        year_length,
        window_size,
        anomaly_series,
        var_explained,
    })?;
    Ok(result)
}

fn to_array<D, Sh>(data: Vec<f64>, shape: Sh) -> Result<ndarray::Array<f64, D>, IoError>
where
    D: ndarray::Dimension,
    Sh: ndarray::ShapeBuilder<Dim = D>,
{
    ndarray::Array::from_shape_vec(shape, data).map_err(|e| IoError::Validation {
        count: 1,
        details: format!("stored data does not match its shape: {e}"),
    })
}
