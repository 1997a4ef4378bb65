use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use strehl_core::cube::{remove_band_cube, remove_band_frame};
use strehl_core::io::fits::FitsImage;

use super::{fits_name, open_fits, stem_path};

#[derive(Args)]
pub struct RemoveBandArgs {
    /// Input FITS frame or cube
    pub file: PathBuf,

    /// First row of the band kept out of the bias estimate (0-based)
    #[arg(long, allow_hyphen_values = true)]
    pub from: i64,

    /// Row after the last one in the band
    #[arg(long, allow_hyphen_values = true)]
    pub to: i64,

    /// Output FITS file (default: <input>_rb.fits)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RemoveBandArgs) -> Result<()> {
    let image = open_fits(&args.file)?;
    let exposure = image.exposure;

    let corrected = if image.is_cube() {
        println!(
            "Removing band {}..{} from {} frames",
            args.from,
            args.to,
            image.frame_count()
        );
        remove_band_cube(&image.cube()?, args.from, args.to)?.into_dyn()
    } else {
        println!("Removing band {}..{}", args.from, args.to);
        remove_band_frame(image.into_frame_data()?, args.from, args.to)?.into_dyn()
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| fits_name(&stem_path(&args.file), "_rb"));
    FitsImage::new(corrected, exposure)
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Output saved to {}", output.display());
    Ok(())
}
