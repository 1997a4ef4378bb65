mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strehl", about = "Strehl ratio analysis for adaptive-optics images")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for frame-parallel work (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the ideal PSF for the configured optics
    Psf(commands::psf::PsfArgs),
    /// Strehl ratio per radius for one frame
    Frame(commands::frame::FrameArgs),
    /// Strehl ratio per radius for every selected cube frame
    Series(commands::series::SeriesArgs),
    /// Locate the brightest source in a frame
    FindBright(commands::find_bright::FindBrightArgs),
    /// Remove row-correlated bias outside a band of rows
    RemoveBand(commands::remove_band::RemoveBandArgs),
    /// Write selected cube frames as individual FITS files
    CubeToFrames(commands::cube::CubeToFramesArgs),
    /// Sum ranges of cube frames into single frames
    CubeStack(commands::cube::CubeStackArgs),
    /// Per-pixel median of a cube
    CubeMedian(commands::cube::CubeMedianArgs),
    /// Divide every cube frame by a flat field
    CubeFlat(commands::cube::CubeFlatArgs),
    /// Combine short cube exposures into longer ones
    AvgCube(commands::cube::AvgCubeArgs),
    /// Convert PNG/TIFF images to FITS frames
    PngToFits(commands::convert::PngToFitsArgs),
    /// Assemble numbered PNG/TIFF images into a FITS cube
    PngToCube(commands::convert::PngToCubeArgs),
    /// Print or save the default analysis config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    match &cli.command {
        Commands::Psf(args) => commands::psf::run(args),
        Commands::Frame(args) => commands::frame::run(args),
        Commands::Series(args) => commands::series::run(args),
        Commands::FindBright(args) => commands::find_bright::run(args),
        Commands::RemoveBand(args) => commands::remove_band::run(args),
        Commands::CubeToFrames(args) => commands::cube::run_to_frames(args),
        Commands::CubeStack(args) => commands::cube::run_stack(args),
        Commands::CubeMedian(args) => commands::cube::run_median(args),
        Commands::CubeFlat(args) => commands::cube::run_flat(args),
        Commands::AvgCube(args) => commands::cube::run_avg(args),
        Commands::PngToFits(args) => commands::convert::run_png_to_fits(args),
        Commands::PngToCube(args) => commands::convert::run_png_to_cube(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
