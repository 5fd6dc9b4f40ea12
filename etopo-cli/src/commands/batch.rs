use anyhow::{Context, Result};
use etopo::GeoPoint;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Points looked up per batched read.
const CHUNK_SIZE: usize = 1000;

pub fn run(
    data_dir: Option<PathBuf>,
    prefix: String,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let service = super::build_service(data_dir, prefix)?;

    let file = File::open(&input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    // Validate everything before touching the dataset; data rows start at line 2
    let points = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            parse_point(record, lat_idx, lon_idx)
                .with_context(|| format!("Invalid coordinate on line {}", i + 2))
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = ProgressBar::new(points.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut elevations = Vec::with_capacity(points.len());
    for chunk in points.chunks(CHUNK_SIZE) {
        let results = service
            .lookup_points(chunk)
            .context("Failed to get elevations")?;
        elevations.extend(results.into_iter().map(|r| r.elevation));
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("done");

    // Prepare output
    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    for (record, elevation) in records.iter().zip(&elevations) {
        let elevation = elevation.to_string();
        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;
    }
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn parse_point(record: &csv::StringRecord, lat_idx: usize, lon_idx: usize) -> Result<GeoPoint> {
    let lat: f64 = record
        .get(lat_idx)
        .context("Missing latitude")?
        .trim()
        .parse()
        .context("Invalid latitude")?;
    let lon: f64 = record
        .get(lon_idx)
        .context("Missing longitude")?
        .trim()
        .parse()
        .context("Invalid longitude")?;

    Ok(GeoPoint::new(lat, lon)?)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_elevation.csv", stem))
}
