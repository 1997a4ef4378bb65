//! Output files for analyzed frames and the reference PSF.

#[cfg(feature = "plot")]
pub mod plot;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::io::table::{write_strehl_table, write_table};
use crate::pipeline::ReferencePsf;
use crate::strehl::StrehlResult;

/// Files written for one report.
#[derive(Clone, Debug, Default)]
pub struct ReportFiles {
    pub table: PathBuf,
    pub plots: Vec<PathBuf>,
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `<base>_strehl.dat` and, with plotting enabled, growth and
/// profile plots comparing the frame with the scaled ideal PSF.
pub fn write_frame_report(
    base: &Path,
    reference: &ReferencePsf,
    result: &StrehlResult,
) -> Result<ReportFiles> {
    let table = with_suffix(base, "_strehl.dat");
    write_strehl_table(&table, result)?;
    info!(path = %table.display(), "Wrote Strehl table");

    let plots = frame_plots(base, reference, result)?;
    Ok(ReportFiles { table, plots })
}

/// Write `<base>_psf.dat` with the ideal PSF's curve of growth and profile,
/// plus a growth plot when plotting is enabled.
pub fn write_psf_report(base: &Path, reference: &ReferencePsf) -> Result<ReportFiles> {
    let growth = reference.psf.require_growth()?;
    let profile = reference.psf.require_profile()?;
    let as_f64 = |v: &[usize]| v.iter().map(|&x| x as f64).collect::<Vec<_>>();

    let table = with_suffix(base, "_psf.dat");
    write_table(
        &table,
        &[
            ("Pixel Radius", as_f64(&growth.radii)),
            ("Enclosed Pixels", as_f64(&growth.npix)),
            ("Ideal Enclosed Energy (normalized)", growth.fluxes.clone()),
            ("Ideal Radial Profile (at radius)", profile.brightness.clone()),
        ],
    )?;
    info!(path = %table.display(), "Wrote PSF table");

    let plots = psf_plots(base, reference)?;
    Ok(ReportFiles { table, plots })
}

#[cfg(feature = "plot")]
fn frame_plots(
    base: &Path,
    reference: &ReferencePsf,
    result: &StrehlResult,
) -> Result<Vec<PathBuf>> {
    use crate::consts::PROFILE_PLOT_MAX_RADIUS;
    use plot::{plot_with_arcseconds, PlotSpec, Series};

    let growth_path = with_suffix(base, "_growth.svg");
    plot_with_arcseconds(
        &growth_path,
        &PlotSpec {
            title: "Curve of growth",
            y_desc: "Enclosed Flux at Radius",
            x_max: reference.max_extent_px,
            plate_scale: reference.scale.plate_scale,
            min_radius_real: reference.scale.min_radius_real,
        },
        &result.radii,
        &[
            Series {
                label: "Science Image",
                values: &result.fluxes,
            },
            Series {
                label: "Ideal PSF",
                values: &result.ideal_fluxes,
            },
        ],
    )?;

    let profile_path = with_suffix(base, "_profile.svg");
    plot_with_arcseconds(
        &profile_path,
        &PlotSpec {
            title: "Radial profile",
            y_desc: "Counts at Radius",
            x_max: PROFILE_PLOT_MAX_RADIUS,
            plate_scale: reference.scale.plate_scale,
            min_radius_real: reference.scale.min_radius_real,
        },
        &result.radii,
        &[
            Series {
                label: "Science Image",
                values: &result.profile,
            },
            Series {
                label: "Ideal PSF",
                values: &result.ideal_profile,
            },
        ],
    )?;

    Ok(vec![growth_path, profile_path])
}

#[cfg(not(feature = "plot"))]
fn frame_plots(_: &Path, _: &ReferencePsf, _: &StrehlResult) -> Result<Vec<PathBuf>> {
    Ok(Vec::new())
}

#[cfg(feature = "plot")]
fn psf_plots(base: &Path, reference: &ReferencePsf) -> Result<Vec<PathBuf>> {
    use plot::{plot_with_arcseconds, PlotSpec, Series};

    let growth = reference.psf.require_growth()?;
    let path = with_suffix(base, "_psf_growth.svg");
    plot_with_arcseconds(
        &path,
        &PlotSpec {
            title: "Ideal PSF curve of growth",
            y_desc: "Enclosed Flux at Radius",
            x_max: reference.growth_max,
            plate_scale: reference.scale.plate_scale,
            min_radius_real: reference.scale.min_radius_real,
        },
        &growth.radii,
        &[Series {
            label: "Ideal PSF",
            values: &growth.fluxes,
        }],
    )?;
    Ok(vec![path])
}

#[cfg(not(feature = "plot"))]
fn psf_plots(_: &Path, _: &ReferencePsf) -> Result<Vec<PathBuf>> {
    Ok(Vec::new())
}
