//! Batched sample reads from the sharded raster.
//!
//! [`DatasetReader`] groups the requested cells by shard, opens every touched
//! shard once, and seeks to each cell in offset order. Distinct shards are read
//! in parallel; a file handle is never shared between reads.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{DatasetConfig, BYTES_PER_CELL};
use crate::error::{EtopoError, Result};
use crate::grid::CellIndex;
use crate::shard::{shard_file_name, ShardAddressor};

/// Consecutive empty or interrupted reads tolerated before a read counts as truncated.
pub const MAX_READ_RETRIES: u32 = 3;

/// On-disk state of one expected shard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardStatus {
    /// Present with the expected length.
    Present,
    /// Not found or not readable.
    Missing,
    /// Present but with the wrong length.
    WrongSize { actual: u64 },
}

/// Report for one shard produced by [`DatasetReader::check_shards`].
#[derive(Debug, Clone)]
pub struct ShardReport {
    pub index: u32,
    pub path: PathBuf,
    pub expected_len: u64,
    pub status: ShardStatus,
}

/// Reads raster samples from a directory of shard files.
#[derive(Debug, Clone)]
pub struct DatasetReader {
    data_dir: PathBuf,
    prefix: String,
    config: DatasetConfig,
    addressor: ShardAddressor,
}

impl DatasetReader {
    /// Create a reader for shards named `{prefix}.NN` inside `data_dir`.
    ///
    /// No file is touched until [`Self::fetch`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::InvalidConfig`] if the geometry is invalid.
    pub fn new<P: AsRef<Path>>(data_dir: P, prefix: &str, config: DatasetConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            addressor: ShardAddressor::new(&config),
            config,
        })
    }

    /// Read the sample of every requested cell.
    ///
    /// Duplicate cells are read once. The returned map has exactly one entry per
    /// distinct requested cell.
    ///
    /// # Errors
    ///
    /// - [`EtopoError::CellOutOfRange`] if a cell lies outside the raster
    /// - [`EtopoError::DatasetUnavailable`] if a shard is missing, unreadable or
    ///   too short
    pub fn fetch<I>(&self, cells: I) -> Result<HashMap<CellIndex, i16>>
    where
        I: IntoIterator<Item = CellIndex>,
    {
        let mut by_shard: BTreeMap<u32, Vec<(u64, CellIndex)>> = BTreeMap::new();
        for cell in cells {
            if cell.row >= self.config.n_rows || cell.col >= self.config.n_cols {
                return Err(EtopoError::CellOutOfRange {
                    row: cell.row,
                    col: cell.col,
                });
            }
            let loc = self.addressor.locate(cell);
            by_shard.entry(loc.shard).or_default().push((loc.offset, cell));
        }

        for reads in by_shard.values_mut() {
            reads.sort_unstable();
            reads.dedup();
        }

        let shards = by_shard.len();
        let samples: Vec<Vec<(CellIndex, i16)>> = by_shard
            .into_par_iter()
            .map(|(shard, reads)| self.read_shard(shard, &reads))
            .collect::<Result<_>>()?;

        let samples: HashMap<CellIndex, i16> = samples.into_iter().flatten().collect();
        tracing::debug!(shards, cells = samples.len(), "Fetched raster samples");

        Ok(samples)
    }

    /// Open one shard and read the given `(offset, cell)` pairs from it.
    fn read_shard(&self, shard: u32, reads: &[(u64, CellIndex)]) -> Result<Vec<(CellIndex, i16)>> {
        let path = self.shard_path(shard);
        tracing::trace!(shard, reads = reads.len(), path = %path.display(), "Reading shard");

        let unavailable = |source: io::Error| EtopoError::DatasetUnavailable {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).map_err(unavailable)?;
        read_samples(&mut file, reads).map_err(unavailable)
    }

    /// Check every expected shard file for presence and length.
    pub fn check_shards(&self) -> Vec<ShardReport> {
        (0..self.addressor.shard_count())
            .map(|index| {
                let path = self.shard_path(index);
                let expected_len = self.addressor.shard_len(index);
                let status = match std::fs::metadata(&path) {
                    Ok(meta) if meta.len() == expected_len => ShardStatus::Present,
                    Ok(meta) => ShardStatus::WrongSize { actual: meta.len() },
                    Err(_) => ShardStatus::Missing,
                };

                ShardReport {
                    index,
                    path,
                    expected_len,
                    status,
                }
            })
            .collect()
    }

    /// Path of shard file `index`.
    pub fn shard_path(&self, index: u32) -> PathBuf {
        self.data_dir.join(shard_file_name(&self.prefix, index))
    }

    /// Number of shard files the dataset is made of.
    pub fn shard_count(&self) -> u32 {
        self.addressor.shard_count()
    }

    /// Directory holding the shard files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Shard file name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Dataset geometry.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }
}

/// Seek to each offset and decode one little-endian `i16` sample.
fn read_samples<R: Read + Seek>(
    reader: &mut R,
    reads: &[(u64, CellIndex)],
) -> io::Result<Vec<(CellIndex, i16)>> {
    let mut samples = Vec::with_capacity(reads.len());
    let mut buf = [0u8; BYTES_PER_CELL as usize];

    for &(offset, cell) in reads {
        reader.seek(SeekFrom::Start(offset))?;
        read_exactly(reader, &mut buf)?;
        samples.push((cell, i16::from_le_bytes(buf)));
    }

    Ok(samples)
}

/// Fill `buf` completely, looping over short reads.
///
/// Empty and interrupted reads are retried up to [`MAX_READ_RETRIES`] times in
/// a row; after that the read fails with [`ErrorKind::UnexpectedEof`].
fn read_exactly<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    let mut stalls = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                stalls += 1;
                if stalls > MAX_READ_RETRIES {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("read {} of {} bytes", filled, buf.len()),
                    ));
                }
            }
            Ok(n) => {
                filled += n;
                stalls = 0;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                stalls += 1;
                if stalls > MAX_READ_RETRIES {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    const PREFIX: &str = "test.bin";

    /// 3x4 raster, 8-byte shards: 24 bytes -> 3 shards.
    fn small_config() -> DatasetConfig {
        DatasetConfig {
            n_rows: 3,
            n_cols: 4,
            cell_size: 60.0,
            shard_capacity: 8,
            resolution: 1,
        }
    }

    /// Write shards whose cell `i` holds `values[i]`.
    fn write_shards(dir: &Path, config: &DatasetConfig, values: &[i16]) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        for (i, chunk) in bytes.chunks(config.shard_capacity as usize).enumerate() {
            let mut file = File::create(dir.join(shard_file_name(PREFIX, i as u32))).unwrap();
            file.write_all(chunk).unwrap();
        }
    }

    /// Reader that hands out at most one byte per call and interleaves
    /// empty and interrupted reads.
    struct StutteringReader {
        data: Vec<u8>,
        pos: usize,
        script: VecDeque<Option<ErrorKind>>,
    }

    impl Read for StutteringReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Some(kind)) => return Err(io::Error::new(kind, "scripted")),
                Some(None) => return Ok(0),
                None => {}
            }
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn test_fetch_across_shards() {
        let dir = TempDir::new().unwrap();
        let config = small_config();
        let values: Vec<i16> = (0..12).map(|i| i * 100 - 500).collect();
        write_shards(dir.path(), &config, &values);

        let reader = DatasetReader::new(dir.path(), PREFIX, config).unwrap();
        assert_eq!(reader.shard_count(), 3);

        let cells = [
            CellIndex::new(0, 0),
            CellIndex::new(1, 1),
            CellIndex::new(2, 3),
            CellIndex::new(1, 1),
        ];
        let samples = reader.fetch(cells).unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[&CellIndex::new(0, 0)], -500);
        assert_eq!(samples[&CellIndex::new(1, 1)], 0);
        assert_eq!(samples[&CellIndex::new(2, 3)], 600);
    }

    #[test]
    fn test_fetch_decodes_little_endian_extremes() {
        let dir = TempDir::new().unwrap();
        let config = small_config();
        let mut values = vec![0i16; 12];
        values[5] = i16::MIN;
        values[6] = i16::MAX;
        values[7] = -1;
        write_shards(dir.path(), &config, &values);

        let reader = DatasetReader::new(dir.path(), PREFIX, config).unwrap();
        let samples = reader
            .fetch([
                CellIndex::new(1, 1),
                CellIndex::new(1, 2),
                CellIndex::new(1, 3),
            ])
            .unwrap();

        assert_eq!(samples[&CellIndex::new(1, 1)], i16::MIN);
        assert_eq!(samples[&CellIndex::new(1, 2)], i16::MAX);
        assert_eq!(samples[&CellIndex::new(1, 3)], -1);
    }

    #[test]
    fn test_missing_shard_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = small_config();
        write_shards(dir.path(), &config, &[7; 12]);
        std::fs::remove_file(dir.path().join("test.bin.02")).unwrap();

        let reader = DatasetReader::new(dir.path(), PREFIX, config).unwrap();

        // Shards 0 and 1 still work.
        assert!(reader.fetch([CellIndex::new(0, 0)]).is_ok());

        match reader.fetch([CellIndex::new(0, 0), CellIndex::new(2, 3)]) {
            Err(EtopoError::DatasetUnavailable { path, source }) => {
                assert!(path.ends_with("test.bin.02"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("Expected DatasetUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_shard_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = small_config();
        write_shards(dir.path(), &config, &[7; 12]);
        // Cut the last shard in the middle of its final sample.
        let path = dir.path().join("test.bin.02");
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(7).unwrap();

        let reader = DatasetReader::new(dir.path(), PREFIX, config).unwrap();
        match reader.fetch([CellIndex::new(2, 3)]) {
            Err(EtopoError::DatasetUnavailable { source, .. }) => {
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof);
            }
            other => panic!("Expected DatasetUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_cell_rejected() {
        let dir = TempDir::new().unwrap();
        let reader = DatasetReader::new(dir.path(), PREFIX, small_config()).unwrap();

        assert!(matches!(
            reader.fetch([CellIndex::new(3, 0)]),
            Err(EtopoError::CellOutOfRange { row: 3, col: 0 })
        ));
        assert!(matches!(
            reader.fetch([CellIndex::new(0, 4)]),
            Err(EtopoError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DatasetConfig {
            shard_capacity: 7,
            ..small_config()
        };
        assert!(matches!(
            DatasetReader::new(".", PREFIX, config),
            Err(EtopoError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_read_exactly_survives_short_reads() {
        let mut reader = StutteringReader {
            data: vec![0x34, 0x12],
            pos: 0,
            script: VecDeque::from([None, Some(ErrorKind::Interrupted), None]),
        };
        let mut buf = [0u8; 2];
        read_exactly(&mut reader, &mut buf).unwrap();
        assert_eq!(i16::from_le_bytes(buf), 0x1234);
    }

    #[test]
    fn test_read_exactly_gives_up_after_retries() {
        let mut reader = StutteringReader {
            data: vec![0x01],
            pos: 0,
            script: VecDeque::new(),
        };
        let mut buf = [0u8; 2];
        let err = read_exactly(&mut reader, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_exactly_propagates_hard_errors() {
        let mut reader = StutteringReader {
            data: vec![0x01, 0x02],
            pos: 0,
            script: VecDeque::from([Some(ErrorKind::PermissionDenied)]),
        };
        let mut buf = [0u8; 2];
        let err = read_exactly(&mut reader, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_read_samples_in_memory() {
        let data: Vec<u8> = [10i16, -20, 30].iter().flat_map(|v| v.to_le_bytes()).collect();
        let reads = [(4, CellIndex::new(0, 2)), (0, CellIndex::new(0, 0))];
        let samples = read_samples(&mut Cursor::new(data), &reads).unwrap();
        assert_eq!(
            samples,
            vec![(CellIndex::new(0, 2), 30), (CellIndex::new(0, 0), 10)]
        );
    }

    #[test]
    fn test_check_shards() {
        let dir = TempDir::new().unwrap();
        let config = small_config();
        write_shards(dir.path(), &config, &[1; 12]);
        std::fs::remove_file(dir.path().join("test.bin.01")).unwrap();
        std::fs::write(dir.path().join("test.bin.02"), [0u8; 3]).unwrap();

        let reader = DatasetReader::new(dir.path(), PREFIX, config).unwrap();
        let reports = reader.check_shards();

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].status, ShardStatus::Present);
        assert_eq!(reports[1].status, ShardStatus::Missing);
        assert_eq!(reports[2].status, ShardStatus::WrongSize { actual: 3 });
        assert_eq!(reports[2].expected_len, 8);
    }
}
