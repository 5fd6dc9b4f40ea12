use anyhow::{Context, Result};
use etopo::LookupResult;
use etopo_service::ApiResponse;
use std::path::PathBuf;

pub fn run(data_dir: Option<PathBuf>, prefix: String, locations: String) -> Result<()> {
    let service = super::build_service(data_dir, prefix)?;

    let results = service
        .lookup(&locations)
        .context("Failed to look up locations")?;

    println!("{}", render(results)?);

    Ok(())
}

/// Render results as the body the HTTP service returns.
fn render(results: Vec<LookupResult>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ApiResponse::ok(results))?)
}
