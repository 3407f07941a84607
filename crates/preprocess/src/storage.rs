//! Storage-backend capability for staging large time x space matrices.
//!
//! The preprocessing code is written against [`Storage`] only; whether an
//! array lives in memory or in a chunked file is decided by whoever builds
//! the backend.

use std::ops::Range;

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::PreprocessError;

/// Opaque reference to an array allocated by a [`Storage`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayHandle(usize);

impl ArrayHandle {
    /// Wraps a backend-specific identifier.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Backend-specific identifier.
    pub fn id(&self) -> usize {
        self.0
    }
}

/// Row-addressable storage of 2-D `f64` arrays.
///
/// All arrays are `f64`; rows are the leading (time) dimension.
pub trait Storage {
    /// Allocates a zero-initialised `(rows, cols)` array.
    fn allocate(&mut self, shape: (usize, usize)) -> Result<ArrayHandle, PreprocessError>;

    /// Shape of an allocated array.
    fn shape(&self, handle: ArrayHandle) -> Result<(usize, usize), PreprocessError>;

    /// Reads a contiguous block of rows.
    fn read_rows(
        &self,
        handle: ArrayHandle,
        rows: Range<usize>,
    ) -> Result<Array2<f64>, PreprocessError>;

    /// Writes `block` starting at row `start`.
    fn write_rows(
        &mut self,
        handle: ArrayHandle,
        start: usize,
        block: ArrayView2<'_, f64>,
    ) -> Result<(), PreprocessError>;

    /// Frees an array. Further use of the handle is an error.
    fn release(&mut self, handle: ArrayHandle) -> Result<(), PreprocessError>;

    /// Reads a whole array.
    fn read(&self, handle: ArrayHandle) -> Result<Array2<f64>, PreprocessError> {
        let (rows, _) = self.shape(handle)?;
        self.read_rows(handle, 0..rows)
    }

    /// Overwrites a whole array.
    fn write(&mut self, handle: ArrayHandle, data: ArrayView2<'_, f64>) -> Result<(), PreprocessError> {
        let (rows, cols) = self.shape(handle)?;
        check_block(rows, cols, 0, data)?;
        self.write_rows(handle, 0, data)
    }

    /// Allocates an array and fills it with `data`.
    fn store(&mut self, data: ArrayView2<'_, f64>) -> Result<ArrayHandle, PreprocessError> {
        let handle = self.allocate(data.dim())?;
        self.write_rows(handle, 0, data)?;
        Ok(handle)
    }
}

/// Validates that `block` fits into a `(rows, cols)` array at row `start`.
pub fn check_block(
    rows: usize,
    cols: usize,
    start: usize,
    block: ArrayView2<'_, f64>,
) -> Result<(), PreprocessError> {
    if block.ncols() != cols {
        return Err(PreprocessError::Shape {
            context: "storage block columns",
            expected: cols,
            got: block.ncols(),
        });
    }
    if start + block.nrows() > rows {
        return Err(PreprocessError::Shape {
            context: "storage block rows",
            expected: rows.saturating_sub(start),
            got: block.nrows(),
        });
    }
    Ok(())
}

/// Validates a row range against an array's row count.
pub fn check_rows(n_rows: usize, rows: &Range<usize>) -> Result<(), PreprocessError> {
    if rows.start > rows.end || rows.end > n_rows {
        return Err(PreprocessError::Shape {
            context: "storage row range",
            expected: n_rows,
            got: rows.end,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory [`Storage`] backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    arrays: Vec<Option<Array2<f64>>>,
}

impl MemoryStorage {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live arrays.
    pub fn n_live(&self) -> usize {
        self.arrays.iter().filter(|a| a.is_some()).count()
    }

    fn get(&self, handle: ArrayHandle) -> Result<&Array2<f64>, PreprocessError> {
        self.arrays
            .get(handle.id())
            .and_then(Option::as_ref)
            .ok_or_else(|| unknown_handle(handle))
    }

    fn get_mut(&mut self, handle: ArrayHandle) -> Result<&mut Array2<f64>, PreprocessError> {
        self.arrays
            .get_mut(handle.id())
            .and_then(Option::as_mut)
            .ok_or_else(|| unknown_handle(handle))
    }
}

fn unknown_handle(handle: ArrayHandle) -> PreprocessError {
    PreprocessError::Storage {
        reason: format!("unknown or released array handle {}", handle.id()),
    }
}

impl Storage for MemoryStorage {
    fn allocate(&mut self, shape: (usize, usize)) -> Result<ArrayHandle, PreprocessError> {
        self.arrays.push(Some(Array2::zeros(shape)));
        Ok(ArrayHandle::new(self.arrays.len() - 1))
    }

    fn shape(&self, handle: ArrayHandle) -> Result<(usize, usize), PreprocessError> {
        Ok(self.get(handle)?.dim())
    }

    fn read_rows(
        &self,
        handle: ArrayHandle,
        rows: Range<usize>,
    ) -> Result<Array2<f64>, PreprocessError> {
        let arr = self.get(handle)?;
        check_rows(arr.nrows(), &rows)?;
        Ok(arr.slice(ndarray::s![rows, ..]).to_owned())
    }

    fn write_rows(
        &mut self,
        handle: ArrayHandle,
        start: usize,
        block: ArrayView2<'_, f64>,
    ) -> Result<(), PreprocessError> {
        let arr = self.get_mut(handle)?;
        let (rows, cols) = arr.dim();
        check_block(rows, cols, start, block)?;
        arr.slice_mut(ndarray::s![start..start + block.nrows(), ..])
            .assign(&block);
        Ok(())
    }

    fn release(&mut self, handle: ArrayHandle) -> Result<(), PreprocessError> {
        let slot = self
            .arrays
            .get_mut(handle.id())
            .ok_or_else(|| unknown_handle(handle))?;
        if slot.take().is_none() {
            return Err(unknown_handle(handle));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StagingCache
// ---------------------------------------------------------------------------

/// Explicitly sized working-memory budget for out-of-core staging.
///
/// Components that stream rows through a [`Storage`] backend size their
/// blocks from this budget. One cache is created per pipeline run and
/// dropped with it.
#[derive(Debug)]
pub struct StagingCache {
    capacity_bytes: usize,
    peak_bytes: usize,
}

impl StagingCache {
    /// Creates a cache holding at most `capacity_bytes` of staged rows.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            peak_bytes: 0,
        }
    }

    /// A cache with no practical limit; blocks span whole arrays.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Configured capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Largest single block staged so far, in bytes.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes
    }

    /// Number of `n_cols`-wide `f64` rows that fit in the budget (at least 1).
    pub fn rows_per_block(&self, n_cols: usize) -> usize {
        let row_bytes = n_cols.max(1) * std::mem::size_of::<f64>();
        (self.capacity_bytes / row_bytes).max(1)
    }

    /// Records that a block of `bytes` was staged.
    pub fn record(&mut self, bytes: usize) {
        self.peak_bytes = self.peak_bytes.max(bytes);
    }
}

impl Drop for StagingCache {
    fn drop(&mut self) {
        debug!(
            capacity_bytes = self.capacity_bytes,
            peak_bytes = self.peak_bytes,
            "staging cache released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn memory_round_trip() {
        let mut store = MemoryStorage::new();
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let h = store.store(data.view()).unwrap();
        assert_eq!(store.shape(h).unwrap(), (3, 2));
        assert_eq!(store.read(h).unwrap(), data);
        assert_eq!(
            store.read_rows(h, 1..3).unwrap(),
            array![[3.0, 4.0], [5.0, 6.0]]
        );
    }

    #[test]
    fn memory_partial_write() {
        let mut store = MemoryStorage::new();
        let h = store.allocate((3, 2)).unwrap();
        store.write_rows(h, 1, array![[7.0, 8.0]].view()).unwrap();
        assert_eq!(
            store.read(h).unwrap(),
            array![[0.0, 0.0], [7.0, 8.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn memory_rejects_out_of_bounds() {
        let mut store = MemoryStorage::new();
        let h = store.allocate((2, 2)).unwrap();
        assert!(store.read_rows(h, 1..3).is_err());
        assert!(
            store
                .write_rows(h, 1, array![[1.0, 1.0], [1.0, 1.0]].view())
                .is_err()
        );
        assert!(store.write_rows(h, 0, array![[1.0]].view()).is_err());
    }

    #[test]
    fn memory_release() {
        let mut store = MemoryStorage::new();
        let h = store.allocate((2, 2)).unwrap();
        assert_eq!(store.n_live(), 1);
        store.release(h).unwrap();
        assert_eq!(store.n_live(), 0);
        assert!(store.read(h).is_err());
        assert!(store.release(h).is_err());
    }

    #[test]
    fn cache_block_rows() {
        let cache = StagingCache::new(8 * 4 * 10);
        assert_eq!(cache.rows_per_block(4), 10);
        assert_eq!(StagingCache::new(1).rows_per_block(4), 1);
    }

    #[test]
    fn cache_tracks_peak() {
        let mut cache = StagingCache::unbounded();
        cache.record(100);
        cache.record(40);
        assert_eq!(cache.peak_bytes(), 100);
    }
}
