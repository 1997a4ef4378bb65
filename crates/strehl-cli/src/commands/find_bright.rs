use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use strehl_core::consts::{DEFAULT_DETECTION_THRESHOLD, DEFAULT_FWHM_PSF};
use strehl_core::detection::{PeakFinder, StarFinder};

use super::open_fits;

#[derive(Args)]
pub struct FindBrightArgs {
    /// Input FITS frame (or cube, with --plane)
    pub file: PathBuf,

    /// 1-based plane when the input is a cube
    #[arg(long, default_value = "1")]
    pub plane: usize,

    /// FWHM estimate in pixels
    #[arg(long, default_value_t = DEFAULT_FWHM_PSF)]
    pub fwhm: f64,

    /// Detection threshold in units of image sigma
    #[arg(long, default_value_t = DEFAULT_DETECTION_THRESHOLD)]
    pub threshold: f64,

    /// List every detection, not only the brightest
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &FindBrightArgs) -> Result<()> {
    let image = open_fits(&args.file)?;
    let data = image.plane(args.plane.saturating_sub(1))?;
    let finder = PeakFinder::new(args.fwhm, args.threshold);

    if args.all {
        let sources = finder.find(&data)?;
        println!("{:>4}  {:>9}  {:>9}  {:>8}", "Id", "X", "Y", "Mag");
        println!("{}", "-".repeat(36));
        for src in &sources {
            println!(
                "{:>4}  {:>9.3}  {:>9.3}  {:>8.3}",
                src.id, src.x, src.y, src.mag
            );
        }
        println!("\n{} source(s) found", sources.len());
    } else {
        let best = finder.brightest(&data)?;
        println!("{:.3} {:.3}", best.x, best.y);
    }
    Ok(())
}
