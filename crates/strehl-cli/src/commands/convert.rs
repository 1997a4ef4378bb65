use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use strehl_core::io::fits::FitsImage;
use strehl_core::io::image_io::{indexed_files, load_image, load_image_stack};

#[derive(Args)]
pub struct PngToFitsArgs {
    /// Input PNG/TIFF images
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// EXPOSURE to record in each header (s)
    #[arg(long)]
    pub exposure: Option<f64>,
}

#[derive(Args)]
pub struct PngToCubeArgs {
    /// Directory holding the numbered images
    pub dir: PathBuf,

    /// File name pattern with $i where the frame number goes
    #[arg(long, default_value = "frame$i.png")]
    pub pattern: String,

    /// EXPOSURE to record in the header (s)
    #[arg(long)]
    pub exposure: Option<f64>,

    /// Output FITS cube
    #[arg(short, long, default_value = "cube.fits")]
    pub output: PathBuf,
}

pub fn run_png_to_fits(args: &PngToFitsArgs) -> Result<()> {
    if let Some(ref dir) = args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    for file in &args.files {
        let data =
            load_image(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let output = match (&args.output_dir, file.file_name()) {
            (Some(dir), Some(name)) => dir.join(name).with_extension("fits"),
            _ => file.with_extension("fits"),
        };
        FitsImage::new(data.into_dyn(), args.exposure)
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("{} -> {}", file.display(), output.display());
    }
    Ok(())
}

pub fn run_png_to_cube(args: &PngToCubeArgs) -> Result<()> {
    let files = indexed_files(&args.dir, &args.pattern)?;
    if files.is_empty() {
        bail!(
            "No files matching '{}' in {}",
            args.pattern,
            args.dir.display()
        );
    }
    let (first, last) = (files[0].0, files[files.len() - 1].0);
    if last - first + 1 != files.len() {
        tracing::warn!(
            first,
            last,
            found = files.len(),
            "Frame numbers are not contiguous"
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    pb.set_message(format!("Reading {} images", files.len()));
    let paths: Vec<PathBuf> = files.into_iter().map(|(_, p)| p).collect();
    let cube = load_image_stack(&paths)?;
    pb.finish_with_message(format!(
        "Read frames {first}-{last} ({}x{})",
        cube.shape()[2],
        cube.shape()[1]
    ));

    FitsImage::new(cube.into_dyn(), args.exposure)
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Cube saved to {}", args.output.display());
    Ok(())
}
