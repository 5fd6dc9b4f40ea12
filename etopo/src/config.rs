//! Dataset geometry.
//!
//! [`DatasetConfig`] describes the raster the service reads: its dimensions,
//! angular cell size, shard capacity and the resolution echoed in results.
//! The defaults describe the ETOPO1 ice-surface grid-registered dataset; other
//! geometries exist so the components can be exercised against small synthetic
//! rasters.

use crate::error::{EtopoError, Result};

/// Number of raster columns in ETOPO1 (one per arc-minute, both edges included).
pub const ETOPO1_COLS: usize = 21601;

/// Number of raster rows in ETOPO1.
pub const ETOPO1_ROWS: usize = 10801;

/// ETOPO1 cell size in degrees (one arc-minute).
pub const ETOPO1_CELL_SIZE: f64 = 1.0 / 60.0;

/// Resolution value reported with every ETOPO1 result.
pub const ETOPO1_RESOLUTION: i32 = 1800;

/// Maximum size of a single shard file in bytes.
pub const ETOPO1_SHARD_CAPACITY: u64 = 30_000_000;

/// Default shard file prefix; shards are named `{prefix}.00`, `{prefix}.01`, ...
pub const DEFAULT_SHARD_PREFIX: &str = "etopo1_ice_g_i2.bin";

/// Bytes per raster sample (signed 16-bit little-endian).
pub const BYTES_PER_CELL: u64 = 2;

/// Immutable geometry of a sharded raster dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetConfig {
    /// Number of rows (row 0 is the north edge).
    pub n_rows: usize,
    /// Number of columns (column 0 is the west edge).
    pub n_cols: usize,
    /// Angular size of one cell in degrees.
    pub cell_size: f64,
    /// Capacity of one shard file in bytes.
    pub shard_capacity: u64,
    /// Resolution echoed in every lookup result.
    pub resolution: i32,
}

impl DatasetConfig {
    /// Geometry of the ETOPO1 global relief model.
    pub fn etopo1() -> Self {
        Self {
            n_rows: ETOPO1_ROWS,
            n_cols: ETOPO1_COLS,
            cell_size: ETOPO1_CELL_SIZE,
            shard_capacity: ETOPO1_SHARD_CAPACITY,
            resolution: ETOPO1_RESOLUTION,
        }
    }

    /// Check the geometry preconditions the other components rely on.
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::InvalidConfig`] if:
    /// - the raster has fewer than two rows or columns (interpolation needs two of each)
    /// - the cell size is not a positive finite number
    /// - the shard capacity is zero or not a multiple of [`BYTES_PER_CELL`], which
    ///   would let a sample straddle two shard files
    pub fn validate(&self) -> Result<()> {
        if self.n_rows < 2 || self.n_cols < 2 {
            return Err(EtopoError::InvalidConfig(format!(
                "raster must be at least 2x2, got {}x{}",
                self.n_rows, self.n_cols
            )));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(EtopoError::InvalidConfig(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        if self.shard_capacity == 0 || self.shard_capacity % BYTES_PER_CELL != 0 {
            return Err(EtopoError::InvalidConfig(format!(
                "shard capacity {} is not a positive multiple of {} bytes",
                self.shard_capacity, BYTES_PER_CELL
            )));
        }
        Ok(())
    }

    /// Total number of cells in the raster.
    pub fn total_cells(&self) -> u64 {
        self.n_rows as u64 * self.n_cols as u64
    }

    /// Size of the logical raster byte stream.
    pub fn total_bytes(&self) -> u64 {
        self.total_cells() * BYTES_PER_CELL
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::etopo1()
    }
}
