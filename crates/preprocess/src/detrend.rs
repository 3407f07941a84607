//! Linear detrending along the time axis.

use ndarray::{Array2, ArrayView2};

/// Removes the least-squares linear fit from each column.
///
/// The fit is against the sample index `0..n`, so the mean is removed along
/// with the trend. Series shorter than two samples become zero.
pub fn detrend(data: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut out = data.to_owned();
    if n == 0 {
        return out;
    }

    let nf = n as f64;
    let t_mean = (nf - 1.0) / 2.0;
    let t_ss: f64 = (0..n).map(|t| (t as f64 - t_mean).powi(2)).sum();

    for mut col in out.columns_mut() {
        let y_mean = col.sum() / nf;
        let slope = if t_ss > 0.0 {
            col.iter()
                .enumerate()
                .map(|(t, &y)| (t as f64 - t_mean) * (y - y_mean))
                .sum::<f64>()
                / t_ss
        } else {
            0.0
        };
        for (t, y) in col.iter_mut().enumerate() {
            *y -= y_mean + slope * (t as f64 - t_mean);
        }
    }
    out
}
