//! Low-level NetCDF extraction helpers.

use std::path::Path;

use netcdf::AttributeValue;

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

/// Look up a variable by name.
pub(crate) fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    file.variable(name).ok_or_else(|| IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D `f64` variable, trying each alias in order.
///
/// Returns the data from the first alias that matches. If none match,
/// returns [`IoError::MissingVariable`] with the first alias as the name.
pub(crate) fn read_1d_f64(
    file: &netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<Vec<f64>, IoError> {
    for &alias in aliases {
        if let Some(var) = file.variable(alias) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }

    let name = aliases.first().copied().unwrap_or("unknown");
    Err(IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read an `N`-D `f64` variable and return the flattened data together with
/// its shape.
pub(crate) fn read_nd_f64<const N: usize>(
    file: &netcdf::File,
    var_name: &str,
    path: &Path,
) -> Result<(Vec<f64>, [usize; N]), IoError> {
    let var = variable(file, var_name, path)?;

    let dims = var.dimensions();
    if dims.len() != N {
        return Err(IoError::DimensionMismatch {
            name: format!("{var_name} dimensions"),
            expected: N,
            got: dims.len(),
        });
    }
    let mut shape = [0usize; N];
    for (s, d) in shape.iter_mut().zip(dims) {
        *s = d.len();
    }

    let data = var.get_values::<f64, _>(..)?;
    Ok((data, shape))
}

/// Read a 1-D integer index variable as `usize`.
pub(crate) fn read_indices(
    file: &netcdf::File,
    var_name: &str,
    path: &Path,
) -> Result<Vec<usize>, IoError> {
    let values = variable(file, var_name, path)?.get_values::<i64, _>(..)?;
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v).map_err(|_| IoError::Validation {
                count: 1,
                details: format!("negative value {v} in index variable '{var_name}'"),
            })
        })
        .collect()
}

/// CF missing-data and packing attributes of a variable.
///
/// Raw values are compared against `_FillValue` and `missing_value` before
/// unpacking with `raw * scale_factor + add_offset`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CfEncoding {
    fill_value: Option<f64>,
    missing_values: Vec<f64>,
    scale_factor: f64,
    add_offset: f64,
}

impl CfEncoding {
    /// Reads the encoding attributes of `var`; absent attributes mean no
    /// masking and identity packing.
    pub(crate) fn of(var: &netcdf::Variable<'_>) -> Self {
        Self {
            fill_value: numeric_attribute(var, "_FillValue").first().copied(),
            missing_values: numeric_attribute(var, "missing_value"),
            scale_factor: numeric_attribute(var, "scale_factor")
                .first()
                .copied()
                .unwrap_or(1.0),
            add_offset: numeric_attribute(var, "add_offset")
                .first()
                .copied()
                .unwrap_or(0.0),
        }
    }

    /// True if the raw value is non-finite or flagged as missing.
    pub(crate) fn is_missing(&self, raw: f64) -> bool {
        !raw.is_finite()
            || self.fill_value == Some(raw)
            || self.missing_values.contains(&raw)
    }

    pub(crate) fn unpack(&self, raw: f64) -> f64 {
        raw * self.scale_factor + self.add_offset
    }

    pub(crate) fn is_packed(&self) -> bool {
        self.scale_factor != 1.0 || self.add_offset != 0.0
    }
}

/// A numeric attribute as `f64` values; empty if absent or not numeric.
fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Vec<f64> {
    let Some(Ok(av)) = var.attribute_value(name) else {
        return Vec::new();
    };
    match av {
        AttributeValue::Double(v) => vec![v],
        AttributeValue::Doubles(v) => v,
        AttributeValue::Float(v) => vec![f64::from(v)],
        AttributeValue::Floats(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Int(v) => vec![f64::from(v)],
        AttributeValue::Ints(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Uint(v) => vec![f64::from(v)],
        AttributeValue::Short(v) => vec![f64::from(v)],
        AttributeValue::Shorts(v) => v.into_iter().map(f64::from).collect(),
        AttributeValue::Ushort(v) => vec![f64::from(v)],
        AttributeValue::Schar(v) => vec![f64::from(v)],
        AttributeValue::Uchar(v) => vec![f64::from(v)],
        _ => Vec::new(),
    }
}

/// Read an integer-valued attribute as `usize`.
pub(crate) fn usize_attribute(var: &netcdf::Variable<'_>, name: &str) -> Result<usize, IoError> {
    let missing = || IoError::MissingAttribute {
        name: name.to_string(),
        variable: var.name(),
    };
    let value = var
        .attribute_value(name)
        .ok_or_else(missing)?
        .map_err(IoError::from)?;
    let v: i64 = match value {
        AttributeValue::Longlong(v) => v,
        AttributeValue::Ulonglong(v) => i64::try_from(v).map_err(|_| missing())?,
        AttributeValue::Int(v) => i64::from(v),
        AttributeValue::Uint(v) => i64::from(v),
        AttributeValue::Short(v) => i64::from(v),
        AttributeValue::Ushort(v) => i64::from(v),
        _ => return Err(missing()),
    };
    usize::try_from(v).map_err(|_| missing())
}
