//! Climatology removal.

use ndarray::{Array2, ArrayView2, Axis, s};

use crate::error::PreprocessError;

/// Anomaly series and the climatology it was computed against.
#[derive(Debug, Clone)]
pub struct Anomaly {
    anomaly: Array2<f64>,
    climatology: Array2<f64>,
}

impl Anomaly {
    /// Anomalies, same shape as the input.
    pub fn anomaly(&self) -> &Array2<f64> {
        &self.anomaly
    }

    /// Climatology, `(year_len x space)`.
    pub fn climatology(&self) -> &Array2<f64> {
        &self.climatology
    }

    /// Splits into `(anomaly, climatology)`.
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.anomaly, self.climatology)
    }
}

/// Removes the seasonal cycle from a time x space matrix.
///
/// The time axis is viewed as `(n_years, year_len)`. Without a supplied
/// climatology, the mean over years of each `(subyear, location)` pair is
/// used. Row `t` of the anomaly is `data[t] - climatology[t % year_len]`.
///
/// # Errors
///
/// - [`PreprocessError::PartialYear`] if `year_len` is 0 or does not divide
///   the number of rows.
/// - [`PreprocessError::Shape`] if the series is empty or a supplied
///   climatology is not `(year_len x space)`.
pub fn calc_anomaly(
    data: ArrayView2<'_, f64>,
    year_len: usize,
    climatology: Option<ArrayView2<'_, f64>>,
) -> Result<Anomaly, PreprocessError> {
    let (n_rows, n_cols) = data.dim();
    if year_len == 0 || n_rows % year_len != 0 {
        return Err(PreprocessError::PartialYear { n_rows, year_len });
    }
    if n_rows == 0 {
        return Err(PreprocessError::Shape {
            context: "anomaly time axis",
            expected: year_len,
            got: 0,
        });
    }

    let climatology = match climatology {
        Some(climo) => {
            if climo.nrows() != year_len {
                return Err(PreprocessError::Shape {
                    context: "climatology rows",
                    expected: year_len,
                    got: climo.nrows(),
                });
            }
            if climo.ncols() != n_cols {
                return Err(PreprocessError::Shape {
                    context: "climatology columns",
                    expected: n_cols,
                    got: climo.ncols(),
                });
            }
            climo.to_owned()
        }
        None => climatology_of(data, year_len),
    };

    let mut anomaly = data.to_owned();
    for sub in 0..year_len {
        let climo_row = climatology.row(sub);
        anomaly
            .slice_mut(s![sub..;year_len, ..])
            .outer_iter_mut()
            .for_each(|mut row| row -= &climo_row);
    }

    Ok(Anomaly {
        anomaly,
        climatology,
    })
}

/// Mean over years for each sub-year position. Requires at least one year.
fn climatology_of(data: ArrayView2<'_, f64>, year_len: usize) -> Array2<f64> {
    let mut climo = Array2::zeros((year_len, data.ncols()));
    for (sub, mut row) in climo.outer_iter_mut().enumerate() {
        let years = data.slice(s![sub..;year_len, ..]);
        let n_years = years.nrows() as f64;
        row.assign(&(years.sum_axis(Axis(0)) / n_years));
    }
    climo
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn climatology_is_mean_over_years() {
        // 3 years of length 2, one location.
        let data = array![[1.0], [10.0], [3.0], [20.0], [5.0], [30.0]];
        let a = calc_anomaly(data.view(), 2, None).unwrap();
        assert_eq!(a.climatology(), &array![[3.0], [20.0]]);
        assert_eq!(
            a.anomaly(),
            &array![[-2.0], [-10.0], [0.0], [0.0], [2.0], [10.0]]
        );
    }

    #[test]
    fn round_trip_restores_input() {
        let data = Array2::from_shape_fn((36, 3), |(t, c)| {
            (t as f64 * 0.7).sin() * (c + 1) as f64 + 0.01 * t as f64
        });
        for year_len in [1, 3, 4, 12] {
            let a = calc_anomaly(data.view(), year_len, None).unwrap();
            let mut restored = a.anomaly().clone();
            for (t, mut row) in restored.outer_iter_mut().enumerate() {
                row += &a.climatology().row(t % year_len);
            }
            assert_abs_diff_eq!(restored, data, epsilon = 1e-12);
        }
    }

    #[test]
    fn supplied_climatology_is_used() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]];
        let climo = array![[1.0, 1.0], [2.0, 2.0]];
        let a = calc_anomaly(data.view(), 2, Some(climo.view())).unwrap();
        assert_eq!(a.climatology(), &climo);
        assert_eq!(
            a.anomaly(),
            &array![[0.0, 1.0], [1.0, 2.0], [4.0, 5.0], [5.0, 6.0]]
        );
    }

    #[test]
    fn anomaly_has_zero_climatology() {
        let data = Array2::from_shape_fn((48, 2), |(t, c)| ((t * 5 + c) % 11) as f64);
        let a = calc_anomaly(data.view(), 12, None).unwrap();
        let recomputed = calc_anomaly(a.anomaly().view(), 12, None).unwrap();
        assert_abs_diff_eq!(
            recomputed.climatology(),
            &Array2::<f64>::zeros((12, 2)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn partial_year_rejected() {
        let data = Array2::<f64>::zeros((25, 2));
        assert!(matches!(
            calc_anomaly(data.view(), 12, None),
            Err(PreprocessError::PartialYear {
                n_rows: 25,
                year_len: 12
            })
        ));
        assert!(matches!(
            calc_anomaly(data.view(), 0, None),
            Err(PreprocessError::PartialYear { .. })
        ));
    }

    #[test]
    fn climatology_shape_checked() {
        let data = Array2::<f64>::zeros((24, 2));
        let bad_rows = Array2::<f64>::zeros((6, 2));
        let bad_cols = Array2::<f64>::zeros((12, 3));
        assert!(matches!(
            calc_anomaly(data.view(), 12, Some(bad_rows.view())),
            Err(PreprocessError::Shape { .. })
        ));
        assert!(matches!(
            calc_anomaly(data.view(), 12, Some(bad_cols.view())),
            Err(PreprocessError::Shape { .. })
        ));
    }

    #[test]
    fn empty_series_rejected() {
        let data = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            calc_anomaly(data.view(), 12, None),
            Err(PreprocessError::Shape { .. })
        ));
    }
}
