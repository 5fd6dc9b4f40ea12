//! Splitting a monolithic raster into shard files.
//!
//! Hosting platforms often cap individual file sizes well below the ~450 MB of
//! the full ETOPO1 grid. [`split_into_shards`] cuts the raw row-major raster
//! stream into sequential files of the configured shard capacity, named the
//! way [`crate::DatasetReader`] expects them.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::config::DatasetConfig;
use crate::error::{EtopoError, Result};
use crate::shard::{shard_file_name, ShardAddressor};

/// Statistics from a split operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Number of shard files written.
    pub shards_written: u32,
    /// Total bytes written across all shards.
    pub bytes_written: u64,
}

/// Split a raw raster stream into shard files inside `out_dir`.
///
/// The input must contain exactly `config.total_bytes()` bytes. `on_shard` is
/// called after each shard file is complete with its index and length.
///
/// # Errors
///
/// - [`EtopoError::InvalidConfig`] if the geometry is invalid
/// - [`EtopoError::InvalidRasterSize`] if the input is shorter or longer than
///   the geometry requires (shards written so far are left in place)
/// - [`EtopoError::Io`] on read or write failures
///
/// # Example
///
/// ```ignore
/// use etopo::{split::split_into_shards, DatasetConfig};
///
/// let input = std::fs::File::open("etopo1_ice_g_i2.bin")?;
/// let stats = split_into_shards(input, "/data/etopo", "etopo1_ice_g_i2.bin",
///     &DatasetConfig::etopo1(), |_, _| {})?;
/// assert_eq!(stats.shards_written, 16);
/// ```
pub fn split_into_shards<R, P, F>(
    mut input: R,
    out_dir: P,
    prefix: &str,
    config: &DatasetConfig,
    mut on_shard: F,
) -> Result<SplitStats>
where
    R: Read,
    P: AsRef<Path>,
    F: FnMut(u32, u64),
{
    config.validate()?;

    let addressor = ShardAddressor::new(config);
    let expected = config.total_bytes();
    let mut stats = SplitStats::default();

    for index in 0..addressor.shard_count() {
        let shard_len = addressor.shard_len(index);
        let path = out_dir.as_ref().join(shard_file_name(prefix, index));

        let mut writer = BufWriter::new(File::create(&path)?);
        let copied = io::copy(&mut (&mut input).take(shard_len), &mut writer)?;
        writer.flush()?;

        stats.bytes_written += copied;
        if copied < shard_len {
            return Err(EtopoError::InvalidRasterSize {
                expected,
                actual: stats.bytes_written,
            });
        }

        stats.shards_written += 1;
        on_shard(index, copied);
        tracing::debug!(shard = index, bytes = copied, path = %path.display(), "Wrote shard");
    }

    let trailing = io::copy(&mut input, &mut io::sink())?;
    if trailing > 0 {
        return Err(EtopoError::InvalidRasterSize {
            expected,
            actual: expected + trailing,
        });
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{DatasetReader, ShardStatus};
    use crate::CellIndex;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn config() -> DatasetConfig {
        DatasetConfig {
            n_rows: 3,
            n_cols: 5,
            cell_size: 60.0,
            shard_capacity: 12,
            resolution: 1,
        }
    }

    fn raster(config: &DatasetConfig) -> Vec<u8> {
        (0..config.total_cells() as i16)
            .flat_map(|v| (v * 3).to_le_bytes())
            .collect()
    }

    #[test]
    fn test_split_then_read() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut seen = Vec::new();

        let stats = split_into_shards(
            Cursor::new(raster(&config)),
            dir.path(),
            "r.bin",
            &config,
            |index, len| seen.push((index, len)),
        )
        .unwrap();

        // 30 bytes in 12-byte shards.
        assert_eq!(
            stats,
            SplitStats {
                shards_written: 3,
                bytes_written: 30
            }
        );
        assert_eq!(seen, vec![(0, 12), (1, 12), (2, 6)]);

        let reader = DatasetReader::new(dir.path(), "r.bin", config).unwrap();
        assert!(reader
            .check_shards()
            .iter()
            .all(|r| r.status == ShardStatus::Present));

        let samples = reader
            .fetch((0..3).flat_map(|row| (0..5).map(move |col| CellIndex::new(row, col))))
            .unwrap();
        for row in 0..3 {
            for col in 0..5 {
                let expected = ((row * 5 + col) * 3) as i16;
                assert_eq!(samples[&CellIndex::new(row, col)], expected);
            }
        }
    }

    #[test]
    fn test_split_short_input() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut data = raster(&config);
        data.truncate(20);

        let result = split_into_shards(Cursor::new(data), dir.path(), "r.bin", &config, |_, _| {});
        match result {
            Err(EtopoError::InvalidRasterSize { expected, actual }) => {
                assert_eq!(expected, 30);
                assert_eq!(actual, 20);
            }
            other => panic!("Expected InvalidRasterSize, got {:?}", other),
        }
    }

    #[test]
    fn test_split_long_input() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let mut data = raster(&config);
        data.extend_from_slice(&[0, 0, 0, 0]);

        let result = split_into_shards(Cursor::new(data), dir.path(), "r.bin", &config, |_, _| {});
        assert!(matches!(
            result,
            Err(EtopoError::InvalidRasterSize {
                expected: 30,
                actual: 34
            })
        ));
    }
}
