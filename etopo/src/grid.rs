//! Coordinate to raster-grid mapping.
//!
//! [`CoordinateMapper`] turns a validated [`GeoPoint`] into a continuous
//! [`GridCoordinate`] and the [`CellQuad`] of four cells surrounding it.
//!
//! # Transform
//!
//! ```text
//! col = (lon + 180 + cell/2) / (360 + cell) * n_cols
//! row = (90 - lat + cell/2) / (180 + cell) * n_rows
//! ```
//!
//! Row 0 is the north edge and column 0 the west edge. The quad always spans
//! two distinct rows and two distinct columns, even on the raster border.

use std::fmt;
use std::str::FromStr;

use crate::config::DatasetConfig;
use crate::error::{EtopoError, Result};

/// A validated WGS84 location in decimal degrees.
///
/// Only obtainable through [`GeoPoint::new`] or parsing, so every instance is
/// within range and finite.
///
/// ```compile_fail
/// let p = etopo::GeoPoint { lat: f64::NAN, lon: 0.0 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Create a point, checking both latitude and longitude ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::OutOfBounds`] if either coordinate is outside its
    /// range or not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(EtopoError::OutOfBounds { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude, -90 to 90.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude, -180 to 180.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl FromStr for GeoPoint {
    type Err = EtopoError;

    /// Parse a `"lat,lon"` pair. Whitespace around either number is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || EtopoError::MalformedPoint {
            input: s.to_string(),
        };

        let (lat, lon) = s.split_once(',').ok_or_else(malformed)?;
        let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let lon: f64 = lon.trim().parse().map_err(|_| malformed())?;

        GeoPoint::new(lat, lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.lat, self.lon)
    }
}

/// Continuous position in raster space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoordinate {
    pub row: f64,
    pub col: f64,
}

/// Integer raster cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The four cells bracketing a grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellQuad {
    pub north: usize,
    pub south: usize,
    pub west: usize,
    pub east: usize,
}

impl CellQuad {
    /// Corner cells in interpolation order: north-west, north-east, south-west, south-east.
    pub fn corners(&self) -> [CellIndex; 4] {
        [
            CellIndex::new(self.north, self.west),
            CellIndex::new(self.north, self.east),
            CellIndex::new(self.south, self.west),
            CellIndex::new(self.south, self.east),
        ]
    }

    /// Offset of `coord` from the north-west corner, clamped to `[0, 1]` per axis.
    ///
    /// Away from the border this equals the fractional part of the coordinate.
    /// On the border, where the quad was shifted inwards, the offset stays on
    /// the cell actually under the point.
    pub fn offset(&self, coord: &GridCoordinate) -> GridCoordinate {
        GridCoordinate {
            row: (coord.row - self.north as f64).clamp(0.0, 1.0),
            col: (coord.col - self.west as f64).clamp(0.0, 1.0),
        }
    }
}

/// Maps geographic points onto the raster of a [`DatasetConfig`].
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    config: DatasetConfig,
}

impl CoordinateMapper {
    /// Create a mapper for a geometry.
    ///
    /// # Errors
    ///
    /// Returns [`EtopoError::InvalidConfig`] if the geometry is invalid (the
    /// bracketing rule needs at least two rows and two columns).
    pub fn new(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Continuous grid position of a point.
    pub fn grid_coordinate(&self, point: &GeoPoint) -> GridCoordinate {
        let cell = self.config.cell_size;
        let half = cell / 2.0;

        // Multiply before dividing so grid points on exact binary fractions map
        // to exact integers.
        let col = (point.lon + 180.0 + half) * self.config.n_cols as f64 / (360.0 + cell);
        let row = (90.0 - point.lat + half) * self.config.n_rows as f64 / (180.0 + cell);

        GridCoordinate { row, col }
    }

    /// Grid position and the four cells to sample for a point.
    pub fn map(&self, point: &GeoPoint) -> (GridCoordinate, CellQuad) {
        let coord = self.grid_coordinate(point);
        let (north, south) = bracket(coord.row, self.config.n_rows);
        let (west, east) = bracket(coord.col, self.config.n_cols);

        (
            coord,
            CellQuad {
                north,
                south,
                west,
                east,
            },
        )
    }

    /// Latitude and longitude at which a cell sits exactly on the grid.
    ///
    /// Inverse of [`Self::grid_coordinate`]. Border cells may lie slightly
    /// outside the valid latitude/longitude range.
    pub fn cell_position(&self, cell: CellIndex) -> (f64, f64) {
        let size = self.config.cell_size;
        let half = size / 2.0;

        let lon = cell.col as f64 * (360.0 + size) / self.config.n_cols as f64 - 180.0 - half;
        let lat = 90.0 + half - cell.row as f64 * (180.0 + size) / self.config.n_rows as f64;

        (lat, lon)
    }
}

/// Lower and upper cell indices around `pos`, clamped to `[0, len - 1]`.
///
/// When both collapse onto the same cell, the pair is widened to two distinct
/// cells: the lower index moves down unless it is already 0, in which case the
/// upper index becomes 1. Requires `len >= 2`.
fn bracket(pos: f64, len: usize) -> (usize, usize) {
    let max = (len - 1) as f64;
    let mut lo = pos.floor().clamp(0.0, max) as usize;
    let mut hi = pos.ceil().clamp(0.0, max) as usize;

    if lo == hi {
        if lo > 0 {
            lo -= 1;
        } else {
            hi = 1;
        }
    }

    (lo, hi)
}
