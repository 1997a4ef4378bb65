use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use strehl_core::cube::{
    average_to_exposure, flat_field, median_frame, parse_ranges, split_frames, sum_ranges,
};
use strehl_core::io::fits::{read_frame, FitsImage};

use super::{fits_name, open_cube, stem_path};

#[derive(Args)]
pub struct CubeToFramesArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// 1-based frame ranges, e.g. "1-10,20-30" (default: every frame)
    #[arg(long)]
    pub frames: Option<String>,

    /// Output directory (default: next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CubeStackArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// 1-based frame ranges to sum, one output per range, e.g. "1-10,11-20"
    #[arg(long)]
    pub ranges: String,

    /// Output base name (default: input path without extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CubeMedianArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// Output FITS file (default: <input>_median.fits)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CubeFlatArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// Flat-field FITS frame
    #[arg(long)]
    pub flat: PathBuf,

    /// Output FITS file (default: <input>_flat.fits)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct AvgCubeArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// Exposure time of each output frame (s)
    #[arg(long)]
    pub exposure: f64,

    /// Exposure time of each input frame (default: from the FITS header)
    #[arg(long)]
    pub old_exposure: Option<f64>,

    /// First frame to use (1-based)
    #[arg(long, default_value = "1")]
    pub from: usize,

    /// Last frame to use, inclusive (default: last frame)
    #[arg(long)]
    pub to: Option<usize>,

    /// Output FITS file (default: <input>_<exposure>s.fits)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run_to_frames(args: &CubeToFramesArgs) -> Result<()> {
    let image = open_cube(&args.file)?;
    let cube = image.cube()?;
    let spec = args
        .frames
        .clone()
        .unwrap_or_else(|| format!("1-{}", image.frame_count()));
    let frames = split_frames(&cube, &parse_ranges(&spec)?)?;

    let stem = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".into());
    let base = match args.output_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir.join(stem)
        }
        None => stem_path(&args.file),
    };

    let pb = ProgressBar::new(frames.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Writing frames");

    for (index, plane) in frames {
        let path = fits_name(&base, &format!("_{index:04}"));
        FitsImage::new(plane.into_dyn(), image.exposure)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish_with_message("Done");
    Ok(())
}

pub fn run_stack(args: &CubeStackArgs) -> Result<()> {
    let image = open_cube(&args.file)?;
    let ranges = parse_ranges(&args.ranges)?;
    let sums = sum_ranges(&image.cube()?, &ranges)?;

    let base = args.output.clone().unwrap_or_else(|| stem_path(&args.file));
    for (&(from, to), sum) in ranges.iter().zip(sums) {
        let count = (to - from + 1) as f64;
        let path = fits_name(&base, &format!("_{from}-{to}"));
        FitsImage::new(sum.into_dyn(), image.exposure.map(|e| e * count))
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Frames {from}-{to} summed into {}", path.display());
    }
    Ok(())
}

pub fn run_median(args: &CubeMedianArgs) -> Result<()> {
    let image = open_cube(&args.file)?;
    println!("Median of {} frames", image.frame_count());
    let median = median_frame(&image.cube()?)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| fits_name(&stem_path(&args.file), "_median"));
    FitsImage::new(median.into_dyn(), image.exposure)
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Output saved to {}", output.display());
    Ok(())
}

pub fn run_flat(args: &CubeFlatArgs) -> Result<()> {
    let image = open_cube(&args.file)?;
    let flat = read_frame(&args.flat)
        .with_context(|| format!("Failed to read flat {}", args.flat.display()))?;
    let corrected = flat_field(&image.cube()?, &flat)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| fits_name(&stem_path(&args.file), "_flat"));
    FitsImage::new(corrected.into_dyn(), image.exposure)
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Output saved to {}", output.display());
    Ok(())
}

pub fn run_avg(args: &AvgCubeArgs) -> Result<()> {
    let image = open_cube(&args.file)?;
    let old_exposure = args.old_exposure.or(image.exposure).with_context(|| {
        format!(
            "{} has no EXPOSURE; pass --old-exposure",
            args.file.display()
        )
    })?;

    let combined = average_to_exposure(
        &image.cube()?,
        old_exposure,
        args.exposure,
        args.from,
        args.to,
    )?;
    println!(
        "{} frames of {old_exposure} s combined into {} of {} s",
        image.frame_count(),
        combined.shape()[0],
        args.exposure
    );

    let output = args.output.clone().unwrap_or_else(|| {
        fits_name(&stem_path(&args.file), &format!("_{}s", args.exposure))
    });
    FitsImage::new(combined.into_dyn(), Some(args.exposure))
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Output saved to {}", output.display());
    Ok(())
}
