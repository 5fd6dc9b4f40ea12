//! Shard addressing.
//!
//! The logical raster is a single row-major byte stream of
//! `n_rows × n_cols × 2` bytes. It is stored as sequential shard files of a
//! fixed capacity, so shard `i` holds the logical bytes
//! `[i × capacity, (i + 1) × capacity)`.
//!
//! # File Naming
//!
//! Shard files are named `{prefix}.{index}` with the index zero-padded to two
//! digits, e.g. `etopo1_ice_g_i2.bin.00` through `etopo1_ice_g_i2.bin.15`.

use crate::config::{DatasetConfig, BYTES_PER_CELL};
use crate::grid::CellIndex;

/// Position of one cell inside the sharded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardLocation {
    /// Index of the shard file.
    pub shard: u32,
    /// Byte offset inside that shard.
    pub offset: u64,
}

/// Converts cell indices into shard locations.
#[derive(Debug, Clone, Copy)]
pub struct ShardAddressor {
    n_cols: u64,
    total_bytes: u64,
    capacity: u64,
}

impl ShardAddressor {
    /// Create an addressor for a validated geometry.
    ///
    /// The configuration must have passed [`DatasetConfig::validate`], which
    /// guarantees every sample lies entirely within one shard.
    pub fn new(config: &DatasetConfig) -> Self {
        Self {
            n_cols: config.n_cols as u64,
            total_bytes: config.total_bytes(),
            capacity: config.shard_capacity,
        }
    }

    /// Shard and intra-shard byte offset of a cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use etopo::{CellIndex, DatasetConfig, ShardAddressor};
    ///
    /// let addressor = ShardAddressor::new(&DatasetConfig::etopo1());
    /// let loc = addressor.locate(CellIndex::new(1000, 0));
    /// // 1000 * 21601 * 2 = 43_202_000 bytes into the stream
    /// assert_eq!(loc.shard, 1);
    /// assert_eq!(loc.offset, 13_202_000);
    /// ```
    pub fn locate(&self, cell: CellIndex) -> ShardLocation {
        let cell_offset = cell.row as u64 * self.n_cols + cell.col as u64;
        let byte_offset = cell_offset * BYTES_PER_CELL;

        ShardLocation {
            shard: (byte_offset / self.capacity) as u32,
            offset: byte_offset % self.capacity,
        }
    }

    /// Number of shard files the dataset is split into.
    pub fn shard_count(&self) -> u32 {
        self.total_bytes.div_ceil(self.capacity) as u32
    }

    /// Expected length in bytes of shard `shard`; only the last one may be short.
    ///
    /// Returns 0 for indices past the end of the dataset.
    pub fn shard_len(&self, shard: u32) -> u64 {
        let start = shard as u64 * self.capacity;
        self.total_bytes.saturating_sub(start).min(self.capacity)
    }
}

/// File name of shard `index` for the given prefix.
///
/// # Examples
///
/// ```
/// use etopo::shard::shard_file_name;
///
/// assert_eq!(shard_file_name("etopo1_ice_g_i2.bin", 0), "etopo1_ice_g_i2.bin.00");
/// assert_eq!(shard_file_name("etopo1_ice_g_i2.bin", 15), "etopo1_ice_g_i2.bin.15");
/// ```
pub fn shard_file_name(prefix: &str, index: u32) -> String {
    format!("{}.{:02}", prefix, index)
}

/// Parse the shard index out of a shard file name.
///
/// Accepts bare names or paths. Returns `None` if the name does not belong to
/// `prefix` or the suffix is not a decimal index.
///
/// # Examples
///
/// ```
/// use etopo::shard::shard_index_from_name;
///
/// assert_eq!(shard_index_from_name("etopo.bin", "etopo.bin.07"), Some(7));
/// assert_eq!(shard_index_from_name("etopo.bin", "/data/etopo.bin.12"), Some(12));
/// assert_eq!(shard_index_from_name("etopo.bin", "other.bin.07"), None);
/// ```
pub fn shard_index_from_name(prefix: &str, name: &str) -> Option<u32> {
    let basename = name.rsplit(['/', '\\']).next()?;
    let suffix = basename.strip_prefix(prefix)?.strip_prefix('.')?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    suffix.parse().ok()
}
