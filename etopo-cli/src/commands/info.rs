use anyhow::{Context, Result};
use etopo::{
    shard::shard_file_name, CellIndex, CoordinateMapper, DatasetConfig, GeoPoint, ShardAddressor,
};

use super::list::format_size;

pub fn run(prefix: String, point: Option<(f64, f64)>) -> Result<()> {
    let config = DatasetConfig::etopo1();
    let mapper = CoordinateMapper::new(config)?;
    let addressor = ShardAddressor::new(&config);

    println!("Dataset: ETOPO1 (1 arc-minute global relief)");
    println!("Grid: {} rows x {} columns", config.n_rows, config.n_cols);
    println!("Cell size: {:.6}°", config.cell_size);
    println!("Resolution: {}", config.resolution);
    println!(
        "Raster size: {} ({} bytes)",
        format_size(config.total_bytes()),
        config.total_bytes()
    );
    println!(
        "Shards: {} x {} (last {})",
        addressor.shard_count(),
        format_size(config.shard_capacity),
        format_size(addressor.shard_len(addressor.shard_count() - 1))
    );
    println!(
        "Files: {} .. {}",
        shard_file_name(&prefix, 0),
        shard_file_name(&prefix, addressor.shard_count() - 1)
    );

    println!();
    println!("Corner cells:");
    let last_row = config.n_rows - 1;
    let last_col = config.n_cols - 1;
    for (name, cell) in [
        ("north-west", CellIndex::new(0, 0)),
        ("north-east", CellIndex::new(0, last_col)),
        ("south-west", CellIndex::new(last_row, 0)),
        ("south-east", CellIndex::new(last_row, last_col)),
    ] {
        let (lat, lon) = mapper.cell_position(cell);
        println!(
            "  {:<11} row {:>5} col {:>5}  lat {:>10.5}  lon {:>11.5}",
            name, cell.row, cell.col, lat, lon
        );
    }

    if let Some((lat, lon)) = point {
        let point = GeoPoint::new(lat, lon).context("Invalid coordinate")?;
        let (coord, quad) = mapper.map(&point);

        println!();
        println!("Point {}:", point);
        println!("  Grid position: row {:.4}, col {:.4}", coord.row, coord.col);
        for cell in quad.corners() {
            let location = addressor.locate(cell);
            println!(
                "  cell ({:>5}, {:>5}) -> {} @ {}",
                cell.row,
                cell.col,
                shard_file_name(&prefix, location.shard),
                location.offset
            );
        }
    }

    Ok(())
}
