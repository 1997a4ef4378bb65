use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use strehl_core::photometry::create_photometer;
use strehl_core::pipeline::ReferencePsf;
use strehl_core::report::write_psf_report;

use super::AnalysisArgs;
use crate::progress::BarReporter;
use crate::summary::print_reference_summary;

#[derive(Args)]
pub struct PsfArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Output base name; writes <base>_psf.dat and plots
    #[arg(short, long, default_value = "ideal")]
    pub output: PathBuf,
}

pub fn run(args: &PsfArgs) -> Result<()> {
    let config = args.analysis.load_config()?;
    let photometer = create_photometer(&config.photometry);

    let reporter = BarReporter::new()?;
    let reference = ReferencePsf::build_reported(&config, photometer.as_ref(), &reporter)?;
    reporter.finish();

    print_reference_summary(&config, &reference);

    let files = write_psf_report(&args.output, &reference)?;
    println!("Table saved to {}", files.table.display());
    for plot in &files.plots {
        println!("Plot saved to {}", plot.display());
    }
    Ok(())
}
