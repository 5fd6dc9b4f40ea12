use anyhow::{bail, Context, Result};
use etopo::{split::split_into_shards, DatasetConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

pub fn run(
    data_dir: Option<PathBuf>,
    prefix: String,
    input: PathBuf,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = DatasetConfig::etopo1();

    let out_dir = match output_dir {
        Some(dir) => dir,
        None => super::resolve_data_dir(data_dir)?,
    };
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let file = File::open(&input).context("Failed to open input file")?;
    let size = file.metadata()?.len();
    if size != config.total_bytes() {
        bail!(
            "{} is {} bytes, expected {} for a {} x {} int16 raster",
            input.display(),
            size,
            config.total_bytes(),
            config.n_rows,
            config.n_cols
        );
    }

    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let stats = split_into_shards(
        BufReader::new(file),
        &out_dir,
        &prefix,
        &config,
        |index, len| {
            pb.inc(len);
            pb.set_message(format!("shard {:02}", index));
        },
    )
    .context("Failed to split raster")?;
    pb.finish_with_message("done");

    println!(
        "Wrote {} shards ({} bytes) to {}",
        stats.shards_written,
        stats.bytes_written,
        out_dir.display()
    );
    Ok(())
}
