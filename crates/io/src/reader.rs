//! Reading a gridded NetCDF field into a time x space matrix.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, info};

use crate::error::IoError;
use crate::netcdf_read;

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Configuration for reading a `(time, lat, lon)` field from NetCDF.
///
/// The [`Default`] implementation reads `sst` with the usual CF coordinate
/// names.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// NetCDF variable holding the field.
    var_name: String,
    /// Aliases to try when looking up latitude coordinates.
    lat_aliases: Vec<String>,
    /// Aliases to try when looking up longitude coordinates.
    lon_aliases: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            var_name: "sst".into(),
            lat_aliases: vec!["lat".into(), "latitude".into(), "y".into()],
            lon_aliases: vec!["lon".into(), "longitude".into(), "x".into()],
        }
    }
}

impl ReaderConfig {
    /// Set the field variable name.
    pub fn with_var_name(mut self, name: impl Into<String>) -> Self {
        self.var_name = name.into();
        self
    }

    /// Replace the latitude aliases.
    pub fn with_lat_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lat_aliases = aliases;
        self
    }

    /// Replace the longitude aliases.
    pub fn with_lon_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lon_aliases = aliases;
        self
    }

    /// Field variable name.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every empty name or alias
    /// list.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        if self.var_name.trim().is_empty() {
            problems.push("var_name must not be empty".to_string());
        }
        if self.lat_aliases.is_empty() {
            problems.push("lat_aliases must not be empty".to_string());
        }
        if self.lon_aliases.is_empty() {
            problems.push("lon_aliases must not be empty".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// FieldData
// ---------------------------------------------------------------------------

/// A gridded field compressed to its valid locations.
///
/// Column `j` of [`FieldData::values`] is the `j`-th unmasked grid cell in
/// row-major `(lat, lon)` order.
#[derive(Debug, Clone)]
pub struct FieldData {
    values: Array2<f64>,
    lats: Array1<f64>,
    lons: Array1<f64>,
    valid: Vec<bool>,
    grid_shape: (usize, usize),
}

impl FieldData {
    /// Time x valid-location matrix.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Consumes the field, returning the time x valid-location matrix.
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Latitude of each column.
    pub fn lats(&self) -> &Array1<f64> {
        &self.lats
    }

    /// Longitude of each column.
    pub fn lons(&self) -> &Array1<f64> {
        &self.lons
    }

    /// Per-cell validity over the full grid, row-major.
    pub fn valid_mask(&self) -> &[bool] {
        &self.valid
    }

    /// Number of unmasked locations.
    pub fn n_valid(&self) -> usize {
        self.values.ncols()
    }

    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.values.nrows()
    }

    /// `(n_lat, n_lon)` of the original grid.
    pub fn grid_shape(&self) -> (usize, usize) {
        self.grid_shape
    }

    /// Expands a per-location vector back to the full grid, with NaN at
    /// masked cells.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::DimensionMismatch`] if `compressed` does not have
    /// one entry per valid location.
    pub fn inflate(&self, compressed: ArrayView1<'_, f64>) -> Result<Array2<f64>, IoError> {
        if compressed.len() != self.n_valid() {
            return Err(IoError::DimensionMismatch {
                name: "valid locations".to_string(),
                expected: self.n_valid(),
                got: compressed.len(),
            });
        }
        let mut grid = Array2::from_elem(self.grid_shape, f64::NAN);
        let mut values = compressed.iter();
        for (cell, &ok) in grid.iter_mut().zip(&self.valid) {
            if ok && let Some(&v) = values.next() {
                *cell = v;
            }
        }
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// read_field
// ---------------------------------------------------------------------------

/// Read a `(time, lat, lon)` field and compress it to its valid locations.
///
/// A cell is masked when any of its raw samples is non-finite or equal to
/// the variable's `_FillValue` or one of its `missing_value`s. Surviving
/// values are unpacked with `scale_factor` and `add_offset`. Coordinates may be 1-D axes (broadcast over the
/// grid) or already per cell.
///
/// # Errors
///
/// Returns [`IoError`] on missing variables, coordinate length mismatches,
/// or if every cell is masked.
#[tracing::instrument(skip_all, fields(path = %path.display(), var = %config.var_name))]
pub fn read_field(path: &Path, config: &ReaderConfig) -> Result<FieldData, IoError> {
    config.validate()?;

    let file = netcdf_read::open_file(path)?;

    let lat_refs: Vec<&str> = config.lat_aliases.iter().map(String::as_str).collect();
    let lon_refs: Vec<&str> = config.lon_aliases.iter().map(String::as_str).collect();
    let lats = netcdf_read::read_1d_f64(&file, &lat_refs, path)?;
    let lons = netcdf_read::read_1d_f64(&file, &lon_refs, path)?;

    let field_var = netcdf_read::variable(&file, &config.var_name, path)?;
    let encoding = netcdf_read::CfEncoding::of(&field_var);
    let (data, [nt, ny, nx]) = netcdf_read::read_nd_f64::<3>(&file, &config.var_name, path)?;
    let n_cells = ny * nx;

    let (cell_lats, cell_lons) = expand_coordinates(lats, lons, ny, nx)?;

    let valid: Vec<bool> = (0..n_cells)
        .map(|c| (0..nt).all(|t| !encoding.is_missing(data[t * n_cells + c])))
        .collect();
    let valid_idx: Vec<usize> = (0..n_cells).filter(|&c| valid[c]).collect();
    let n_valid = valid_idx.len();

    if n_valid == 0 {
        return Err(IoError::Validation {
            count: 1,
            details: format!("all {n_cells} grid cells contain missing data"),
        });
    }
    if n_valid < n_cells {
        info!(
            n_total = n_cells,
            n_valid,
            n_masked = n_cells - n_valid,
            "masked grid cells with missing data"
        );
    }

    if encoding.is_packed() {
        debug!(?encoding, "unpacking field values");
    }
    let values = Array2::from_shape_fn((nt, n_valid), |(t, j)| {
        encoding.unpack(data[t * n_cells + valid_idx[j]])
    });
    let lats = valid_idx.iter().map(|&c| cell_lats[c]).collect();
    let lons = valid_idx.iter().map(|&c| cell_lons[c]).collect();
    debug!(n_times = nt, n_valid, "field compressed");

    Ok(FieldData {
        values,
        lats,
        lons,
        valid,
        grid_shape: (ny, nx),
    })
}

/// Broadcast 1-D latitude/longitude axes to per-cell vectors in row-major
/// `(lat, lon)` order, or pass per-cell coordinates through.
fn expand_coordinates(
    lats: Vec<f64>,
    lons: Vec<f64>,
    ny: usize,
    nx: usize,
) -> Result<(Vec<f64>, Vec<f64>), IoError> {
    let n_cells = ny * nx;
    if lats.len() == ny && lons.len() == nx {
        let cell_lats = lats.iter().flat_map(|&lat| std::iter::repeat_n(lat, nx)).collect();
        let cell_lons = (0..ny).flat_map(|_| lons.iter().copied()).collect();
        return Ok((cell_lats, cell_lons));
    }
    if lats.len() == n_cells && lons.len() == n_cells {
        return Ok((lats, lons));
    }
    Err(IoError::DimensionMismatch {
        name: "lat".to_string(),
        expected: ny,
        got: lats.len(),
    })
}
