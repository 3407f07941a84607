//! Runtime choice of staging backend.

use std::ops::Range;

use anyhow::{Context, Result, bail};
use lim_io::NetcdfStorage;
use lim_preprocess::{ArrayHandle, MemoryStorage, PreprocessError, Storage};
use ndarray::{Array2, ArrayView2};
use tracing::info;

use crate::config::StorageToml;

/// A [`Storage`] selected from `[storage].backend`.
#[derive(Debug)]
pub enum Backend {
    Memory(MemoryStorage),
    Netcdf(NetcdfStorage),
}

impl Backend {
    /// Opens the configured backend.
    pub fn open(cfg: &StorageToml) -> Result<Self> {
        match cfg.backend.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory(MemoryStorage::new())),
            "netcdf" => {
                let store = match &cfg.scratch_dir {
                    Some(dir) => NetcdfStorage::create_in(dir, cfg.chunk_rows),
                    None => NetcdfStorage::create(cfg.chunk_rows),
                }
                .context("failed to create netcdf staging")?;
                info!(path = %store.path().display(), chunk_rows = cfg.chunk_rows, "netcdf staging");
                Ok(Self::Netcdf(store))
            }
            other => bail!("unknown storage backend: {other:?}"),
        }
    }
}

impl Storage for Backend {
    fn allocate(&mut self, shape: (usize, usize)) -> Result<ArrayHandle, PreprocessError> {
        match self {
            Self::Memory(s) => s.allocate(shape),
            Self::Netcdf(s) => s.allocate(shape),
        }
    }

    fn shape(&self, handle: ArrayHandle) -> Result<(usize, usize), PreprocessError> {
        match self {
            Self::Memory(s) => s.shape(handle),
            Self::Netcdf(s) => s.shape(handle),
        }
    }

    fn read_rows(
        &self,
        handle: ArrayHandle,
        rows: Range<usize>,
    ) -> Result<Array2<f64>, PreprocessError> {
        match self {
            Self::Memory(s) => s.read_rows(handle, rows),
            Self::Netcdf(s) => s.read_rows(handle, rows),
        }
    }

    fn write_rows(
        &mut self,
        handle: ArrayHandle,
        start: usize,
        block: ArrayView2<'_, f64>,
    ) -> Result<(), PreprocessError> {
        match self {
            Self::Memory(s) => s.write_rows(handle, start, block),
            Self::Netcdf(s) => s.write_rows(handle, start, block),
        }
    }

    fn release(&mut self, handle: ArrayHandle) -> Result<(), PreprocessError> {
        match self {
            Self::Memory(s) => s.release(handle),
            Self::Netcdf(s) => s.release(handle),
        }
    }
}
