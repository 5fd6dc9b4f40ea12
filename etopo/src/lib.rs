//! # etopo - Global Elevation Lookup
//!
//! Batched elevation queries against the ETOPO1 global relief model stored as
//! a set of fixed-size shard files.
//!
//! ## Features
//!
//! - **Batched**: every distinct cell of a request is read once, each shard
//!   file is opened once per request
//! - **Parallel**: shards touched by a request are read concurrently
//! - **Interpolated**: bilinear interpolation between the four cells around
//!   each point, including at the poles and the antimeridian
//! - **Strict**: one invalid point fails the batch, a missing or short shard is
//!   an error instead of a silent default
//!
//! ## Quick Start
//!
//! ```ignore
//! use etopo::LookupServiceBuilder;
//!
//! let service = LookupServiceBuilder::new("/data/etopo").build()?;
//! let results = service.lookup("27.9881,86.9250|0,0")?;
//! for r in results {
//!     println!("{}: {}m", r.point, r.elevation);
//! }
//! ```
//!
//! ## Dataset Format
//!
//! The raster is `10801 × 21601` signed 16-bit little-endian samples in
//! row-major order (row 0 = north edge, column 0 = west edge), one sample per
//! arc-minute. The byte stream is split into sequential shard files of
//! 30,000,000 bytes named `etopo1_ice_g_i2.bin.00` … `etopo1_ice_g_i2.bin.15`.
//! Use [`split::split_into_shards`] to produce them from the monolithic file.

pub mod config;
pub mod error;
pub mod grid;
pub mod interpolate;
pub mod reader;
pub mod service;
pub mod shard;
pub mod split;

// Re-export main types at crate root for convenience
pub use config::{DatasetConfig, BYTES_PER_CELL, DEFAULT_SHARD_PREFIX};
pub use error::{EtopoError, Result};
pub use grid::{CellIndex, CellQuad, CoordinateMapper, GeoPoint, GridCoordinate};
pub use reader::{DatasetReader, ShardReport, ShardStatus};
pub use service::{LookupResult, LookupService, LookupServiceBuilder};
pub use shard::{ShardAddressor, ShardLocation};
