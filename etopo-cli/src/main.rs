use anyhow::Result;
use clap::{Parser, Subcommand};
use etopo::DEFAULT_SHARD_PREFIX;
use std::path::PathBuf;

mod commands;

/// ETOPO1 elevation data CLI tool
#[derive(Parser)]
#[command(name = "etopo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing the shard files
    #[arg(short, long, env = "ETOPO_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Shard file name prefix
    #[arg(
        short,
        long,
        env = "ETOPO_SHARD_PREFIX",
        default_value = DEFAULT_SHARD_PREFIX,
        global = true
    )]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Look up a `lat,lon|lat,lon|...` list and print the API response
    Lookup {
        /// Locations, e.g. "27.98,86.92|-33.9,151.2"
        #[arg(allow_hyphen_values = true)]
        locations: String,
    },

    /// Add an elevation column to a CSV of coordinates
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_elevation.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display dataset geometry, optionally tracing one coordinate through it
    Info {
        /// Latitude to trace
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude to trace
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Check the shard files in the data directory
    List,

    /// Split a monolithic raster file into shard files
    Split {
        /// Raw little-endian int16 raster (e.g. etopo1_ice_g_i2.bin)
        input: PathBuf,

        /// Output directory (defaults to the data directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { lat, lon, json } => {
            commands::query::run(cli.data_dir, cli.prefix, lat, lon, json)
        }
        Commands::Lookup { locations } => commands::lookup::run(cli.data_dir, cli.prefix, locations),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(cli.data_dir, cli.prefix, input, output, lat_col, lon_col),
        Commands::Info { lat, lon } => commands::info::run(cli.prefix, lat.zip(lon)),
        Commands::List => commands::list::run(cli.data_dir, cli.prefix),
        Commands::Split { input, output_dir } => {
            commands::split::run(cli.data_dir, cli.prefix, input, output_dir)
        }
    }
}
