//! Basic example demonstrating etopo library usage.
//!
//! Run with: cargo run --example basic -- /path/to/etopo/shards

use etopo::{EtopoError, LookupServiceBuilder};
use std::env;

fn main() -> Result<(), EtopoError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/etopo/shards");
        std::process::exit(1);
    });

    let service = LookupServiceBuilder::new(&data_dir).build()?;

    let missing: Vec<_> = service
        .check_shards()
        .into_iter()
        .filter(|r| r.status != etopo::ShardStatus::Present)
        .collect();
    if !missing.is_empty() {
        eprintln!("{} of {} shards unusable", missing.len(), service.shard_count());
    }

    // Query some famous places in one batch
    let names = [
        "Mount Everest, Nepal",
        "Challenger Deep, Pacific",
        "Dead Sea shore",
        "South Pole",
    ];
    let locations = "27.9881,86.9250|11.3733,142.5917|31.5590,35.4732|-90,0";

    println!("Elevation queries (bilinear):");
    println!("{:-<50}", "");

    match service.lookup(locations) {
        Ok(results) => {
            for (name, result) in names.iter().zip(results) {
                println!("{}: {}m", name, result.elevation);
            }
        }
        Err(e) => println!("lookup failed: {}", e),
    }

    Ok(())
}
