//! Batched elevation lookup service.
//!
//! This module provides [`LookupService`], the high-level entry point that
//! turns a `lat,lon|lat,lon|...` request into one interpolated elevation per
//! point.
//!
//! A lookup runs in four steps:
//!
//! 1. parse and validate every point (one bad point fails the whole batch)
//! 2. map each point to its grid coordinate and four surrounding cells
//! 3. read all distinct cells in one batched [`DatasetReader::fetch`]
//! 4. interpolate each point and assemble results in input order
//!
//! ```ignore
//! use etopo::LookupServiceBuilder;
//!
//! let service = LookupServiceBuilder::new("/data/etopo").build()?;
//!
//! for result in service.lookup("27.9881,86.9250|35.3606,138.7274")? {
//!     println!("{}: {}m", result.point, result.elevation);
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::{DatasetConfig, DEFAULT_SHARD_PREFIX};
use crate::error::{EtopoError, Result};
use crate::grid::{CellIndex, CellQuad, CoordinateMapper, GeoPoint, GridCoordinate};
use crate::interpolate::interpolate;
use crate::reader::{DatasetReader, ShardReport};

/// Elevation at one requested point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupResult {
    /// The point as requested.
    pub point: GeoPoint,
    /// Interpolated elevation in metres, rounded to the nearest integer.
    pub elevation: i32,
    /// Dataset resolution.
    pub resolution: i32,
}

/// Parse a `|`-separated list of `lat,lon` pairs.
///
/// # Errors
///
/// - [`EtopoError::EmptyRequest`] if the input is empty or blank
/// - [`EtopoError::InvalidLocation`] for the first entry that is malformed or
///   out of bounds, carrying its zero-based index
///
/// # Examples
///
/// ```
/// use etopo::service::parse_locations;
///
/// let points = parse_locations("0,0|-33.9,151.2").unwrap();
/// assert_eq!(points.len(), 2);
/// assert!(parse_locations("").is_err());
/// ```
pub fn parse_locations(raw: &str) -> Result<Vec<GeoPoint>> {
    if raw.trim().is_empty() {
        return Err(EtopoError::EmptyRequest);
    }

    raw.split('|')
        .enumerate()
        .map(|(index, entry)| {
            entry
                .parse::<GeoPoint>()
                .map_err(|e| EtopoError::InvalidLocation {
                    index,
                    source: Box::new(e),
                })
        })
        .collect()
}

/// Elevation lookup over a sharded global raster.
///
/// The service holds no mutable state and is safe to share between threads
/// (e.g. behind an `Arc` in an HTTP server). Every call opens the shard files
/// it needs and closes them before returning.
///
/// # Example
///
/// ```ignore
/// use etopo::LookupService;
///
/// let service = LookupService::builder("/data/etopo").build()?;
/// let everest = service.lookup_point(etopo::GeoPoint::new(27.9881, 86.9250)?)?;
/// println!("Elevation: {}m", everest.elevation);
/// ```
#[derive(Debug, Clone)]
pub struct LookupService {
    reader: DatasetReader,
    mapper: CoordinateMapper,
}

impl LookupService {
    /// Create a service over an existing reader.
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::InvalidConfig`] if the reader's geometry is invalid.
    pub fn new(reader: DatasetReader) -> Result<Self> {
        Ok(Self {
            mapper: CoordinateMapper::new(*reader.config())?,
            reader,
        })
    }

    /// Create a builder for the given data directory.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> LookupServiceBuilder {
        LookupServiceBuilder::new(data_dir)
    }

    /// Look up every point of a raw `lat,lon|lat,lon|...` request.
    ///
    /// Results are returned in request order. No partial results are produced:
    /// any invalid entry or read failure fails the whole request.
    ///
    /// # Errors
    ///
    /// Input errors ([`EtopoError::is_invalid_request`]) from
    /// [`parse_locations`], or dataset errors from [`Self::lookup_points`].
    pub fn lookup(&self, raw: &str) -> Result<Vec<LookupResult>> {
        let points = parse_locations(raw)?;
        self.lookup_points(&points)
    }

    /// Look up a batch of already validated points.
    ///
    /// Cells shared between points are read once.
    ///
    /// # Errors
    ///
    /// - [`EtopoError::DatasetUnavailable`] if a required shard cannot be read
    /// - [`EtopoError::InterpolationUndefined`] if a corner sample is absent
    pub fn lookup_points(&self, points: &[GeoPoint]) -> Result<Vec<LookupResult>> {
        let mapped: Vec<(GridCoordinate, CellQuad)> =
            points.iter().map(|p| self.mapper.map(p)).collect();

        let cells: HashSet<CellIndex> = mapped
            .iter()
            .flat_map(|(_, quad)| quad.corners())
            .collect();
        let samples = self.reader.fetch(cells)?;

        let resolution = self.reader.config().resolution;
        points
            .iter()
            .zip(&mapped)
            .map(|(point, (coord, quad))| {
                let corners = quad.corners().map(|cell| samples.get(&cell).copied());
                let z = interpolate(quad.offset(coord), corners).map_err(|e| {
                    tracing::error!(
                        point = %point,
                        quad = ?quad,
                        error = %e,
                        "Corner sample missing after a successful read"
                    );
                    e
                })?;

                Ok(LookupResult {
                    point: *point,
                    elevation: z.round() as i32,
                    resolution,
                })
            })
            .collect()
    }

    /// Look up a single point.
    pub fn lookup_point(&self, point: GeoPoint) -> Result<LookupResult> {
        let mut results = self.lookup_points(&[point])?;
        // lookup_points returns exactly one result per input point
        Ok(results.remove(0))
    }

    /// Check every expected shard file for presence and length.
    pub fn check_shards(&self) -> Vec<ShardReport> {
        self.reader.check_shards()
    }

    /// Number of shard files the dataset is made of.
    pub fn shard_count(&self) -> u32 {
        self.reader.shard_count()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        self.reader.data_dir()
    }

    /// Shard file name prefix.
    pub fn shard_prefix(&self) -> &str {
        self.reader.prefix()
    }

    /// Dataset geometry.
    pub fn config(&self) -> &DatasetConfig {
        self.reader.config()
    }
}

/// Builder for creating [`LookupService`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use etopo::LookupServiceBuilder;
///
/// let service = LookupServiceBuilder::new("/data/etopo")
///     .shard_prefix("etopo1_bed_g_i2.bin")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct LookupServiceBuilder {
    data_dir: PathBuf,
    shard_prefix: String,
    config: DatasetConfig,
}

impl LookupServiceBuilder {
    /// Create a new builder with the specified data directory and ETOPO1 geometry.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            shard_prefix: DEFAULT_SHARD_PREFIX.to_string(),
            config: DatasetConfig::etopo1(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ETOPO_DATA_DIR` | Directory containing shard files | Required |
    /// | `ETOPO_SHARD_PREFIX` | Shard file name prefix | `etopo1_ice_g_i2.bin` |
    ///
    /// # Errors
    ///
    /// Returns an error if `ETOPO_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("ETOPO_DATA_DIR").map_err(|_| {
            EtopoError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "ETOPO_DATA_DIR environment variable not set",
            ))
        })?;

        let shard_prefix = std::env::var("ETOPO_SHARD_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHARD_PREFIX.to_string());

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            shard_prefix,
            config: DatasetConfig::etopo1(),
        })
    }

    /// Set the data directory.
    ///
    /// Overrides the directory set in the constructor or from environment.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the shard file name prefix.
    pub fn shard_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shard_prefix = prefix.into();
        self
    }

    /// Set the dataset geometry. Defaults to ETOPO1.
    pub fn config(mut self, config: DatasetConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the [`LookupService`].
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::InvalidConfig`] if the geometry is invalid.
    pub fn build(self) -> Result<LookupService> {
        let reader = DatasetReader::new(&self.data_dir, &self.shard_prefix, self.config)?;
        LookupService::new(reader)
    }
}
