use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use strehl_core::cube::{parse_ranges, range_indices};
use strehl_core::detection::PeakFinder;
use strehl_core::io::table::write_strehl_series;
use strehl_core::photometry::create_photometer;
use strehl_core::pipeline::{analyze_series, ReferencePsf};

use super::{open_cube, stem_path, AnalysisArgs};
use crate::progress::BarReporter;
use crate::summary::print_reference_summary;

#[derive(Args)]
pub struct SeriesArgs {
    /// Input FITS cube
    pub file: PathBuf,

    /// 1-based frame ranges, e.g. "1-10,20-30" (default: every frame)
    #[arg(long)]
    pub frames: Option<String>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Output table (default: <input>_strehl_series.dat)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &SeriesArgs) -> Result<()> {
    let config = args.analysis.load_config()?;
    let photometer = create_photometer(&config.photometry);
    let finder = PeakFinder::from(&config.detection);

    let image = open_cube(&args.file)?;
    let cube = image.cube()?;
    let total = image.frame_count();
    let indices = match args.frames {
        Some(ref spec) => range_indices(&parse_ranges(spec)?, total)?,
        None => (1..=total).collect(),
    };

    let reporter = BarReporter::new()?;
    let reference = ReferencePsf::build_reported(&config, photometer.as_ref(), &reporter)?;
    print_reference_summary(&config, &reference);

    let series = analyze_series(
        &reference,
        &cube,
        &indices,
        &finder,
        photometer.as_ref(),
        &reporter,
    )
    .with_context(|| format!("Failed to analyze {}", args.file.display()))?;
    reporter.finish();

    let output = args.output.clone().unwrap_or_else(|| {
        let mut name = stem_path(&args.file).into_os_string();
        name.push("_strehl_series.dat");
        PathBuf::from(name)
    });
    write_strehl_series(&output, &series.radii, &series.rows)?;

    println!(
        "\n{} frames analyzed at {} radii",
        series.rows.len(),
        series.radii.len()
    );
    println!("Series saved to {}", output.display());
    Ok(())
}
