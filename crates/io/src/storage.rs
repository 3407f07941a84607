//! Chunked NetCDF [`Storage`] backend.
//!
//! Each allocated array becomes a `(rows_<k>, cols_<k>)` variable, chunked
//! along rows. Released variables are kept in a free list and reused by the
//! next allocation of the same shape, so repeated pipeline runs do not grow
//! the file. The file lives in a private temporary directory that is removed
//! when the backend is dropped.

use std::ops::Range;
use std::path::{Path, PathBuf};

use lim_preprocess::{ArrayHandle, PreprocessError, Storage, check_block, check_rows};
use ndarray::{Array2, ArrayView2};
use tempfile::TempDir;
use tracing::debug;

use crate::error::IoError;

const SCRATCH_FILE: &str = "staging.nc";

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    shape: (usize, usize),
}

/// [`Storage`] backend writing arrays to a chunked NetCDF scratch file.
pub struct NetcdfStorage {
    file: netcdf::FileMut,
    path: PathBuf,
    chunk_rows: usize,
    slots: Vec<Option<Slot>>,
    free: Vec<Slot>,
    n_variables: usize,
    // Dropped after `file`, so the file is closed before its directory goes.
    _dir: TempDir,
}

impl std::fmt::Debug for NetcdfStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetcdfStorage")
            .field("path", &self.path)
            .field("chunk_rows", &self.chunk_rows)
            .field("slots", &self.slots)
            .field("free", &self.free)
            .finish_non_exhaustive()
    }
}

impl NetcdfStorage {
    /// Creates a backend in a fresh directory under the system temporary
    /// directory. Arrays are chunked in blocks of `chunk_rows` rows.
    ///
    /// # Errors
    ///
    /// See [`NetcdfStorage::create_in`].
    pub fn create(chunk_rows: usize) -> Result<Self, IoError> {
        Self::create_in(&std::env::temp_dir(), chunk_rows)
    }

    /// Creates a backend in a fresh directory under `parent`. The directory
    /// and its scratch file are removed when the backend is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `chunk_rows` is zero,
    /// [`IoError::Scratch`] if the directory cannot be created, or
    /// [`IoError::Netcdf`] if the file cannot be created.
    pub fn create_in(parent: &Path, chunk_rows: usize) -> Result<Self, IoError> {
        if chunk_rows == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "chunk_rows must be greater than 0".to_string(),
            });
        }
        let dir = tempfile::Builder::new()
            .prefix("lim-staging-")
            .tempdir_in(parent)
            .map_err(|e| IoError::Scratch {
                dir: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        let path = dir.path().join(SCRATCH_FILE);
        let file = netcdf::create(&path)?;
        debug!(path = %path.display(), chunk_rows, "netcdf storage created");
        Ok(Self {
            file,
            path,
            chunk_rows,
            slots: Vec::new(),
            free: Vec::new(),
            n_variables: 0,
            _dir: dir,
        })
    }

    /// Location of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows per chunk.
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    /// Number of live arrays.
    pub fn n_live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of NetCDF variables created in the scratch file, live or free.
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    fn slot(&self, handle: ArrayHandle) -> Result<&Slot, PreprocessError> {
        self.slots
            .get(handle.id())
            .and_then(Option::as_ref)
            .ok_or_else(|| PreprocessError::Storage {
                reason: format!("unknown or released array handle {}", handle.id()),
            })
    }

    fn new_variable(&mut self, shape: (usize, usize)) -> Result<Slot, PreprocessError> {
        let (rows, cols) = shape;
        let k = self.n_variables;
        let row_dim = format!("rows_{k}");
        let col_dim = format!("cols_{k}");
        let name = format!("array_{k}");

        self.file.add_dimension(&row_dim, rows).map_err(backend)?;
        self.file.add_dimension(&col_dim, cols).map_err(backend)?;
        let mut var = self
            .file
            .add_variable::<f64>(&name, &[row_dim.as_str(), col_dim.as_str()])
            .map_err(backend)?;
        var.set_chunking(&[self.chunk_rows.min(rows), cols])
            .map_err(backend)?;
        var.set_fill_value(0.0_f64).map_err(backend)?;
        self.n_variables += 1;
        debug!(name = %name, rows, cols, "storage variable created");
        Ok(Slot { name, shape })
    }

    /// Overwrites a reused variable with zeros, one chunk at a time.
    fn zero(&mut self, slot: &Slot) -> Result<(), PreprocessError> {
        let (rows, cols) = slot.shape;
        let mut var = self
            .file
            .variable_mut(&slot.name)
            .ok_or_else(|| missing_variable(&slot.name))?;
        let zeros = vec![0.0_f64; self.chunk_rows.min(rows) * cols];
        for start in (0..rows).step_by(self.chunk_rows) {
            let end = (start + self.chunk_rows).min(rows);
            var.put_values(&zeros[..(end - start) * cols], [start..end, 0..cols])
                .map_err(backend)?;
        }
        Ok(())
    }
}

fn backend(e: netcdf::Error) -> PreprocessError {
    PreprocessError::Storage {
        reason: format!("netcdf: {e}"),
    }
}

fn missing_variable(name: &str) -> PreprocessError {
    PreprocessError::Storage {
        reason: format!("storage variable '{name}' not found"),
    }
}

impl Storage for NetcdfStorage {
    fn allocate(&mut self, shape: (usize, usize)) -> Result<ArrayHandle, PreprocessError> {
        let (rows, cols) = shape;
        if rows == 0 || cols == 0 {
            return Err(PreprocessError::Storage {
                reason: format!("cannot allocate an empty {rows}x{cols} array"),
            });
        }
        let slot = match self.free.iter().position(|s| s.shape == shape) {
            Some(pos) => {
                let slot = self.free.swap_remove(pos);
                self.zero(&slot)?;
                debug!(name = %slot.name, rows, cols, "storage variable reused");
                slot
            }
            None => self.new_variable(shape)?,
        };
        let id = self.slots.len();
        self.slots.push(Some(slot));
        Ok(ArrayHandle::new(id))
    }

    fn shape(&self, handle: ArrayHandle) -> Result<(usize, usize), PreprocessError> {
        Ok(self.slot(handle)?.shape)
    }

    fn read_rows(
        &self,
        handle: ArrayHandle,
        rows: Range<usize>,
    ) -> Result<Array2<f64>, PreprocessError> {
        let slot = self.slot(handle)?;
        let (n_rows, n_cols) = slot.shape;
        check_rows(n_rows, &rows)?;
        let n = rows.end - rows.start;
        if n == 0 {
            return Ok(Array2::zeros((0, n_cols)));
        }
        let var = self
            .file
            .variable(&slot.name)
            .ok_or_else(|| missing_variable(&slot.name))?;
        let values = var
            .get_values::<f64, _>([rows, 0..n_cols])
            .map_err(backend)?;
        Array2::from_shape_vec((n, n_cols), values).map_err(|e| PreprocessError::Storage {
            reason: format!("read block has wrong length: {e}"),
        })
    }

    fn write_rows(
        &mut self,
        handle: ArrayHandle,
        start: usize,
        block: ArrayView2<'_, f64>,
    ) -> Result<(), PreprocessError> {
        let slot = self.slot(handle)?.clone();
        let (n_rows, n_cols) = slot.shape;
        check_block(n_rows, n_cols, start, block)?;
        if block.nrows() == 0 {
            return Ok(());
        }
        let data: Vec<f64> = block.iter().copied().collect();
        let mut var = self
            .file
            .variable_mut(&slot.name)
            .ok_or_else(|| missing_variable(&slot.name))?;
        var.put_values(&data, [start..start + block.nrows(), 0..n_cols])
            .map_err(backend)?;
        Ok(())
    }

    fn release(&mut self, handle: ArrayHandle) -> Result<(), PreprocessError> {
        let slot = self
            .slots
            .get_mut(handle.id())
            .and_then(Option::take)
            .ok_or_else(|| PreprocessError::Storage {
                reason: format!("unknown or released array handle {}", handle.id()),
            })?;
        debug!(name = %slot.name, "storage array released");
        self.free.push(slot);
        Ok(())
    }
}
