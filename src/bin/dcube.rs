//! Command-line entry point for catalog maintenance and ingestion scans.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use datacube_core::{
    Datacube, DatacubeError, DateRange, LogFileSink, ProcessingLevel, RangeScanJob, RemoveOutcome,
    Result, ScanConfig, TileCode, scan_range, scan_tree,
};

#[derive(Parser)]
#[command(
    name = "dcube",
    version,
    about = "Maintain NcML datacube catalogs for NetCDF raster collections"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a platform/year/month/day archive for one tile and level and
    /// record the matches in the configured catalog.
    Create {
        /// Start date, YYYY-MM-DD.
        #[arg(short = 's', long, value_parser = parse_date)]
        start_date: NaiveDate,
        /// End date, YYYY-MM-DD (inclusive).
        #[arg(short = 'e', long, value_parser = parse_date)]
        end_date: NaiveDate,
        /// Tile identifier, e.g. T27XVH.
        #[arg(short = 't', long, value_parser = parse_tile)]
        tile: TileCode,
        /// Processing level: L1B, L1C or L2A.
        #[arg(short = 'l', long, value_parser = parse_level)]
        level: ProcessingLevel,
        /// TOML configuration file.
        #[arg(short = 'c', long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Walk a directory tree and sort every raster file into its
    /// per-tile, per-year catalog.
    IngestTree {
        /// Base path under which partition catalogs are stored.
        ncml_base: PathBuf,
        /// Root directory to search for raster files.
        root: PathBuf,
        /// Directory for scan logs; defaults to the current directory.
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Print the product locations recorded in a catalog.
    List { ncml: PathBuf },
    /// Check that every recorded product still exists on disk.
    Validate { ncml: PathBuf },
    /// Remove one product location from a catalog.
    Remove { ncml: PathBuf, location: String },
    /// Remove every product from a catalog.
    Clear { ncml: PathBuf },
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DatacubeError::Validation {
        field: "date",
        reason: format!("{value:?} must be in the format YYYY-MM-DD"),
    })
}

fn parse_tile(value: &str) -> Result<TileCode> {
    TileCode::from_str(value)
}

fn parse_level(value: &str) -> Result<ProcessingLevel> {
    ProcessingLevel::from_str(value)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Create {
            start_date,
            end_date,
            tile,
            level,
            config,
        } => {
            let config = ScanConfig::load(&config)?;
            let range = DateRange::new(start_date, end_date)?;
            let job = RangeScanJob {
                base_path: config.base_path.clone(),
                platforms: config.platform_dirs(),
                range,
                tile,
                level,
            };
            if job.platforms.is_empty() {
                tracing::warn!("no platforms configured; nothing to scan");
            }

            let log_dir = config.log_path.clone().unwrap_or_else(|| PathBuf::from("."));
            let mut sink = LogFileSink::for_run(&log_dir)?;
            println!("Initializing datacube at: {}", config.ncml_path.display());
            let mut cube = Datacube::open(&config.ncml_path)?;

            let summary = scan_range(&job, &mut cube, &mut sink)?;
            sink.finish()?;

            if summary.has_mismatches() {
                println!(
                    "Provided tile or level was not found in some searched directories. \
                     If you suspect misspelling, check the mismatch log."
                );
            }
            println!(
                "Datacube creation complete: {} added, {} already present, \
                 {} directories missing.",
                summary.added, summary.already_present, summary.missing_directories
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::IngestTree {
            ncml_base,
            root,
            log_dir,
        } => {
            let log_dir = log_dir.unwrap_or_else(|| PathBuf::from("."));
            let mut sink = LogFileSink::for_run(&log_dir)?;
            let summary = scan_tree(&root, &ncml_base, &mut sink)?;
            sink.finish()?;
            println!(
                "Ingested {} raster files ({} pattern mismatches).",
                summary.added, summary.mismatches
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::List { ncml } => {
            let cube = Datacube::open(&ncml)?;
            for location in cube.list_products() {
                println!("{location}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { ncml } => {
            let cube = Datacube::open(&ncml)?;
            let report = cube.validate();
            if report.is_valid() {
                println!("All recorded products exist.");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("Missing raster files:");
                for location in &report.missing {
                    println!(" - {location}");
                }
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Remove { ncml, location } => {
            let mut cube = Datacube::open(&ncml)?;
            match cube.remove_product(&location)? {
                RemoveOutcome::Removed => println!("Removed: {location}"),
                RemoveOutcome::NotFound => println!("Product not found: {location}"),
                RemoveOutcome::NoAggregation => println!("No aggregation found in {}", ncml.display()),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear { ncml } => {
            let mut cube = Datacube::open(&ncml)?;
            cube.clear()?;
            println!("Cleared: {}", ncml.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
