//! Error types for the etopo library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when looking up elevations.
#[derive(Error, Debug)]
pub enum EtopoError {
    /// IO error outside of shard reads (e.g. writing shard files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request did not contain any location.
    #[error("No locations provided.")]
    EmptyRequest,

    /// One entry of a batch request could not be turned into a point.
    #[error("Invalid location in index {index}.")]
    InvalidLocation {
        index: usize,
        #[source]
        source: Box<EtopoError>,
    },

    /// A location string is not of the form `lat,lon`.
    #[error("Malformed location {input:?} (expected \"lat,lon\")")]
    MalformedPoint { input: String },

    /// Coordinates are outside the globe.
    #[error("Coordinates out of bounds: lat={lat}, lon={lon} (valid: lat ±90°, lon ±180°)")]
    OutOfBounds { lat: f64, lon: f64 },

    /// A shard file is missing, unreadable or shorter than expected.
    #[error("Dataset unavailable: {path}: {source}")]
    DatasetUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cell index outside the raster reached the reader.
    #[error("Cell out of range: row={row}, col={col}")]
    CellOutOfRange { row: usize, col: usize },

    /// A corner sample required for interpolation is absent.
    #[error("Interpolation undefined: missing {corner} corner sample")]
    InterpolationUndefined { corner: &'static str },

    /// Raster input to the splitter has the wrong length.
    #[error("Invalid raster size: {actual} bytes (expected {expected})")]
    InvalidRasterSize { expected: u64, actual: u64 },

    /// Dataset geometry violates a precondition.
    #[error("Invalid dataset configuration: {0}")]
    InvalidConfig(String),
}

impl EtopoError {
    /// Whether the error was caused by the caller's input rather than the dataset.
    ///
    /// The HTTP layer maps these to `400 INVALID_REQUEST`; everything else is a
    /// generic server error.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            EtopoError::EmptyRequest
                | EtopoError::InvalidLocation { .. }
                | EtopoError::MalformedPoint { .. }
                | EtopoError::OutOfBounds { .. }
        )
    }
}

/// Result type alias using [`EtopoError`].
pub type Result<T> = std::result::Result<T, EtopoError>;
