//! Running-mean smoothing along the time axis.

use ndarray::{Array2, ArrayView2, s};
use tracing::debug;

use crate::error::PreprocessError;
use crate::storage::{ArrayHandle, StagingCache, Storage};

/// Number of samples removed from each end of a smoothed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimEdges {
    bottom: usize,
    top: usize,
}

impl TrimEdges {
    /// Creates edges removing `bottom` leading and `top` trailing samples.
    pub fn new(bottom: usize, top: usize) -> Self {
        Self { bottom, top }
    }

    /// No trimming.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Samples removed from the start of the series.
    pub fn bottom(&self) -> usize {
        self.bottom
    }

    /// Samples removed from the end of the series.
    pub fn top(&self) -> usize {
        self.top
    }

    /// Total samples removed.
    pub fn total(&self) -> usize {
        self.bottom + self.top
    }
}

/// Edge trimming convention for [`running_mean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrim {
    /// Remove only the samples where the window does not fit.
    Window,
    /// Additionally round each edge up to a whole number of years of the
    /// given length, so the result starts and ends on year boundaries.
    WholeYears(usize),
}

/// A smoothed series together with the edges that were trimmed from it.
#[derive(Debug, Clone)]
pub struct Smoothed {
    data: Array2<f64>,
    edges: TrimEdges,
}

impl Smoothed {
    /// Smoothed data, `(rows - edges.total()) x cols`.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Trimmed edges relative to the input.
    pub fn edges(&self) -> TrimEdges {
        self.edges
    }

    /// Consumes the result, returning the smoothed data.
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }
}

/// Computes the trim edges for a window.
///
/// `bottom = floor(w/2)` and `top = floor(w/2) + (w mod 2) - 1`, so that
/// `bottom + top = w - 1`. With [`EdgeTrim::WholeYears`] each edge is rounded
/// up to a multiple of the year length (a year length of 0 is treated as 1).
///
/// # Panics
///
/// Panics if `window` is 0.
pub fn trim_edges(window: usize, trim: EdgeTrim) -> TrimEdges {
    assert!(window > 0, "trim_edges: window must be positive");
    let bottom = window / 2;
    let top = window / 2 + window % 2 - 1;
    match trim {
        EdgeTrim::Window => TrimEdges::new(bottom, top),
        EdgeTrim::WholeYears(year_len) => {
            let year_len = year_len.max(1);
            TrimEdges::new(
                bottom.div_ceil(year_len) * year_len,
                top.div_ceil(year_len) * year_len,
            )
        }
    }
}

/// Validates a window against a series length and returns its edges.
fn checked_edges(window: usize, trim: EdgeTrim, n_rows: usize) -> Result<TrimEdges, PreprocessError> {
    if window == 0 || window > n_rows {
        return Err(PreprocessError::InvalidWindow { window, n_rows });
    }
    let edges = trim_edges(window, trim);
    if edges.total() >= n_rows {
        return Err(PreprocessError::InvalidWindow { window, n_rows });
    }
    Ok(edges)
}

/// Means of `n_out` consecutive windows of `window` rows over `block`.
///
/// Output row `i` averages `block[i..i + window]`. Both the in-memory and the
/// staged paths go through here so their results are bit-identical.
fn window_means(block: ArrayView2<'_, f64>, window: usize, n_out: usize) -> Array2<f64> {
    let mut out = Array2::zeros((n_out, block.ncols()));
    let scale = window as f64;
    for (i, mut row) in out.outer_iter_mut().enumerate() {
        for k in i..i + window {
            row += &block.row(k);
        }
        row /= scale;
    }
    out
}

/// Applies a running mean of `window` samples along the time (row) axis.
///
/// Output row `i` is the mean of input rows starting at
/// `i + edges.bottom() - floor(window / 2)`; for [`EdgeTrim::Window`] that is
/// rows `[i, i + window)`.
///
/// # Errors
///
/// Returns [`PreprocessError::InvalidWindow`] if `window` is 0, exceeds the
/// number of rows, or trims away the entire series.
pub fn running_mean(
    data: ArrayView2<'_, f64>,
    window: usize,
    trim: EdgeTrim,
) -> Result<Smoothed, PreprocessError> {
    let n_rows = data.nrows();
    let edges = checked_edges(window, trim, n_rows)?;
    let offset = edges.bottom() - window / 2;
    let n_out = n_rows - edges.total();

    debug!(window, bottom = edges.bottom(), top = edges.top(), n_out, "running mean");

    let block = data.slice(s![offset..offset + n_out + window - 1, ..]);
    Ok(Smoothed {
        data: window_means(block, window, n_out),
        edges,
    })
}

/// Applies [`running_mean`] to an array held by a storage backend.
///
/// Input rows are streamed in blocks sized from `cache`; the result is written
/// to a newly allocated array in the same backend. The numeric result is
/// identical to [`running_mean`] on the materialised input.
///
/// # Errors
///
/// Returns [`PreprocessError::InvalidWindow`] under the same conditions as
/// [`running_mean`], or any error raised by the backend.
pub fn running_mean_staged<S: Storage>(
    storage: &mut S,
    input: ArrayHandle,
    window: usize,
    trim: EdgeTrim,
    cache: &mut StagingCache,
) -> Result<(ArrayHandle, TrimEdges), PreprocessError> {
    let (n_rows, n_cols) = storage.shape(input)?;
    let edges = checked_edges(window, trim, n_rows)?;
    let offset = edges.bottom() - window / 2;
    let n_out = n_rows - edges.total();
    let output = storage.allocate((n_out, n_cols))?;

    let block_out = cache
        .rows_per_block(n_cols)
        .saturating_sub(window - 1)
        .max(1);

    let mut out_start = 0;
    while out_start < n_out {
        let out_end = (out_start + block_out).min(n_out);
        let in_start = out_start + offset;
        let in_end = out_end + offset + window - 1;
        let block = storage.read_rows(input, in_start..in_end)?;
        cache.record(block.len() * std::mem::size_of::<f64>());

        let means = window_means(block.view(), window, out_end - out_start);
        storage.write_rows(output, out_start, means.view())?;
        out_start = out_end;
    }

    debug!(window, n_out, block_out, "staged running mean");
    Ok((output, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn ramp(n: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, cols), |(t, c)| t as f64 + 100.0 * c as f64)
    }

    #[test]
    fn edges_even_window() {
        let e = trim_edges(12, EdgeTrim::Window);
        assert_eq!((e.bottom(), e.top()), (6, 5));
    }

    #[test]
    fn edges_odd_window() {
        let e = trim_edges(5, EdgeTrim::Window);
        assert_eq!((e.bottom(), e.top()), (2, 2));
    }

    #[test]
    fn edges_sum_to_window_minus_one() {
        for w in 1..40 {
            let e = trim_edges(w, EdgeTrim::Window);
            assert_eq!(e.total(), w - 1, "window {w}");
        }
    }

    #[test]
    fn edges_whole_years() {
        let e = trim_edges(12, EdgeTrim::WholeYears(12));
        assert_eq!((e.bottom(), e.top()), (12, 12));
        let e = trim_edges(2, EdgeTrim::WholeYears(12));
        assert_eq!((e.bottom(), e.top()), (12, 0));
        let e = trim_edges(1, EdgeTrim::WholeYears(12));
        assert_eq!((e.bottom(), e.top()), (0, 0));
        let e = trim_edges(12, EdgeTrim::WholeYears(0));
        assert_eq!((e.bottom(), e.top()), (6, 5));
    }

    #[test]
    fn row_count_matches_edges() {
        let data = ramp(50, 3);
        for w in 1..=50 {
            let sm = running_mean(data.view(), w, EdgeTrim::Window);
            if w == 50 {
                // 50 - 49 = 1 row left
                assert_eq!(sm.unwrap().data().nrows(), 1);
                continue;
            }
            let sm = sm.unwrap();
            assert_eq!(sm.data().nrows(), 50 - sm.edges().total());
            assert_eq!(sm.data().ncols(), 3);
        }
    }

    #[test]
    fn window_values() {
        let data = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let sm = running_mean(data.view(), 2, EdgeTrim::Window).unwrap();
        assert_eq!(sm.data(), &array![[1.5], [2.5], [3.5], [4.5]]);
        assert_eq!(sm.edges(), TrimEdges::new(1, 0));
    }

    #[test]
    fn ramp_is_centered() {
        // Mean of a linear ramp over an odd window equals the centre sample.
        let data = ramp(20, 2);
        let sm = running_mean(data.view(), 5, EdgeTrim::Window).unwrap();
        for (i, row) in sm.data().outer_iter().enumerate() {
            let centre = i + sm.edges().bottom();
            assert_abs_diff_eq!(row[0], centre as f64, epsilon = 1e-12);
            assert_abs_diff_eq!(row[1], centre as f64 + 100.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn whole_years_trim() {
        let data = ramp(120, 4);
        let sm = running_mean(data.view(), 12, EdgeTrim::WholeYears(12)).unwrap();
        assert_eq!(sm.data().nrows(), 96);
        assert_eq!(sm.edges(), TrimEdges::new(12, 12));
        // First output is centred on raw index 12: window [6, 18) → mean 11.5.
        assert_abs_diff_eq!(sm.data()[[0, 0]], 11.5, epsilon = 1e-12);
    }

    #[test]
    fn window_too_large() {
        let data = ramp(5, 1);
        assert!(matches!(
            running_mean(data.view(), 6, EdgeTrim::Window),
            Err(PreprocessError::InvalidWindow { window: 6, n_rows: 5 })
        ));
        assert!(matches!(
            running_mean(data.view(), 0, EdgeTrim::Window),
            Err(PreprocessError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn whole_years_trim_everything() {
        let data = ramp(24, 1);
        assert!(matches!(
            running_mean(data.view(), 12, EdgeTrim::WholeYears(12)),
            Err(PreprocessError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn staged_matches_in_memory() {
        let data = Array2::from_shape_fn((73, 5), |(t, c)| ((t * 7 + c * 13) % 17) as f64 * 0.37);
        let expected = running_mean(data.view(), 12, EdgeTrim::WholeYears(12)).unwrap();

        for capacity in [1, 8 * 5 * 13, 8 * 5 * 20, usize::MAX] {
            let mut store = MemoryStorage::new();
            let mut cache = StagingCache::new(capacity);
            let input = store.store(data.view()).unwrap();
            let (out, edges) =
                running_mean_staged(&mut store, input, 12, EdgeTrim::WholeYears(12), &mut cache)
                    .unwrap();
            assert_eq!(edges, expected.edges());
            assert_eq!(&store.read(out).unwrap(), expected.data());
        }
    }
}
