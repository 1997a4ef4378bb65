use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use strehl_core::detection::PeakFinder;
use strehl_core::frame::Center;
use strehl_core::photometry::create_photometer;
use strehl_core::pipeline::{analyze_frame, analyze_frame_found, ReferencePsf};
use strehl_core::report::write_frame_report;

use super::{open_fits, stem_path, AnalysisArgs};
use crate::progress::BarReporter;
use crate::summary::{print_reference_summary, print_strehl_result};

#[derive(Args)]
pub struct FrameArgs {
    /// Input FITS frame (or cube, with --plane)
    pub file: PathBuf,

    /// Source column (0-based); found automatically when omitted
    #[arg(long, requires = "y")]
    pub x: Option<f64>,

    /// Source row (0-based)
    #[arg(long, requires = "x")]
    pub y: Option<f64>,

    /// 1-based plane to analyze when the input is a cube
    #[arg(long)]
    pub plane: Option<usize>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Output base name (default: input path without extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &FrameArgs) -> Result<()> {
    let config = args.analysis.load_config()?;
    let photometer = create_photometer(&config.photometry);

    let image = open_fits(&args.file)?;
    let data = match (image.is_cube(), args.plane) {
        (true, Some(plane)) if plane >= 1 => image.plane(plane - 1)?,
        (true, _) => bail!(
            "{} is a cube of {} frames; choose one with --plane",
            args.file.display(),
            image.frame_count()
        ),
        (false, _) => image.into_frame_data()?,
    };

    let reporter = BarReporter::new()?;
    let reference = ReferencePsf::build_reported(&config, photometer.as_ref(), &reporter)?;
    reporter.finish();
    print_reference_summary(&config, &reference);

    let analysis = match (args.x, args.y) {
        (Some(x), Some(y)) => {
            analyze_frame(&reference, data, Center::new(x, y), photometer.as_ref())
        }
        _ => {
            let finder = PeakFinder::from(&config.detection);
            analyze_frame_found(&reference, data, &finder, photometer.as_ref())
        }
    }
    .with_context(|| format!("Failed to analyze {}", args.file.display()))?;

    if let Some(center) = analysis.frame.center {
        println!("Source at x={:.2}, y={:.2}\n", center.x, center.y);
    }
    print_strehl_result(&analysis.result);

    let base = args.output.clone().unwrap_or_else(|| stem_path(&args.file));
    let files = write_frame_report(&base, &reference, &analysis.result)?;
    println!("Table saved to {}", files.table.display());
    for plot in &files.plots {
        println!("Plot saved to {}", plot.display());
    }
    Ok(())
}
