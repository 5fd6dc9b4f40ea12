pub mod batch;
pub mod info;
pub mod list;
pub mod lookup;
pub mod query;
pub mod split;

use anyhow::{Context, Result};
use etopo::{LookupService, LookupServiceBuilder};
use std::path::PathBuf;

const MISSING_DATA_DIR: &str =
    "ETOPO_DATA_DIR environment variable not set. Use --data-dir or set ETOPO_DATA_DIR";

/// Require the data directory; clap has already applied `ETOPO_DATA_DIR`.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    data_dir.context(MISSING_DATA_DIR)
}

/// Build the lookup service for the given directory and shard prefix.
pub fn build_service(data_dir: Option<PathBuf>, prefix: String) -> Result<LookupService> {
    let dir = resolve_data_dir(data_dir)?;
    LookupServiceBuilder::new(dir)
        .shard_prefix(prefix)
        .build()
        .context("Failed to create lookup service")
}
