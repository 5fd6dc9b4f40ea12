use anyhow::{bail, Context, Result};
use etopo::{shard::shard_index_from_name, LookupServiceBuilder, ShardStatus};
use std::fs;
use std::path::PathBuf;

pub fn run(data_dir: Option<PathBuf>, prefix: String) -> Result<()> {
    let dir = super::resolve_data_dir(data_dir)?;

    if !dir.exists() {
        bail!("Data directory does not exist: {}", dir.display());
    }

    let service = LookupServiceBuilder::new(&dir).shard_prefix(prefix).build()?;
    let reports = service.check_shards();

    let mut present = 0;
    let mut missing = 0;
    let mut wrong_size = 0;
    let mut total_size: u64 = 0;

    println!("{:<28} {:>12} {:>20}", "SHARD", "EXPECTED", "STATUS");
    println!("{}", "-".repeat(62));

    for report in &reports {
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let status = match report.status {
            ShardStatus::Present => {
                present += 1;
                total_size += report.expected_len;
                "ok".to_string()
            }
            ShardStatus::Missing => {
                missing += 1;
                "MISSING".to_string()
            }
            ShardStatus::WrongSize { actual } => {
                wrong_size += 1;
                total_size += actual;
                format!("WRONG SIZE ({})", actual)
            }
        };

        println!(
            "{:<28} {:>12} {:>20}",
            name,
            format_size(report.expected_len),
            status
        );
    }

    // Files carrying the prefix but beyond the expected shard range
    let mut stray: Vec<String> = fs::read_dir(&dir)
        .context("Failed to read data directory")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| {
            shard_index_from_name(service.shard_prefix(), name)
                .is_some_and(|index| index >= service.shard_count())
        })
        .collect();
    stray.sort();

    // Summary
    println!();
    println!("Summary:");
    println!("  Expected shards: {}", reports.len());
    println!("  Present: {}", present);
    if missing > 0 {
        println!("  Missing: {}", missing);
    }
    if wrong_size > 0 {
        println!("  Wrong size: {}", wrong_size);
    }
    if !stray.is_empty() {
        println!("  Unexpected: {}", stray.join(", "));
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data directory: {}", dir.display());

    if missing + wrong_size > 0 {
        bail!(
            "{} of {} shards unusable",
            missing + wrong_size,
            reports.len()
        );
    }

    Ok(())
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
