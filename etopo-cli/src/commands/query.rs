use anyhow::{Context, Result};
use etopo::GeoPoint;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    elevation: i32,
    resolution: i32,
}

pub fn run(
    data_dir: Option<PathBuf>,
    prefix: String,
    lat: f64,
    lon: f64,
    json: bool,
) -> Result<()> {
    let service = super::build_service(data_dir, prefix)?;

    let point = GeoPoint::new(lat, lon).context("Invalid coordinate")?;
    let result = service
        .lookup_point(point)
        .context("Failed to get elevation")?;

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            elevation: result.elevation,
            resolution: result.resolution,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", result.elevation);
    }

    Ok(())
}
