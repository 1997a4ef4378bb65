//! Tab-delimited result tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, StrehlError};
use crate::strehl::StrehlResult;

/// Column headers of the per-frame Strehl table.
pub const STREHL_TABLE_COLUMNS: [&str; 7] = [
    "Pixel Radius",
    "Enclosed Pixels",
    "Image Enclosed Energy (counts)",
    "Ideal Enclosed Energy (counts)",
    "Strehl Ratio (for peak in this radius)",
    "Image Radial Profile (counts at radius)",
    "Ideal Radial Profile (counts at radius)",
];

fn tab_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(out)
}

/// Write named, equal-length numeric columns: one header row of names,
/// then one row per index with five decimals per value.
pub fn write_table(path: &Path, columns: &[(&str, Vec<f64>)]) -> Result<()> {
    let rows = columns.first().map_or(0, |(_, c)| c.len());
    if let Some((_, col)) = columns.iter().find(|(_, c)| c.len() != rows) {
        return Err(StrehlError::ShapeMismatch {
            expected: (rows, columns.len()),
            actual: (col.len(), 1),
        });
    }

    let mut wtr = tab_writer(File::create(path)?);
    wtr.write_record(columns.iter().map(|(name, _)| *name))?;
    for i in 0..rows {
        wtr.write_record(columns.iter().map(|(_, col)| format!("{:.5}", col[i])))?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows, columns = columns.len(), "Wrote table");
    Ok(())
}

/// Write the per-radius table of one analyzed frame.
pub fn write_strehl_table(path: &Path, result: &StrehlResult) -> Result<()> {
    let as_f64 = |v: &[usize]| v.iter().map(|&x| x as f64).collect::<Vec<_>>();
    let data = [
        as_f64(&result.radii),
        as_f64(&result.npix),
        result.fluxes.clone(),
        result.ideal_fluxes.clone(),
        result.strehl.clone(),
        result.profile.clone(),
        result.ideal_profile.clone(),
    ];
    let columns: Vec<(&str, Vec<f64>)> = STREHL_TABLE_COLUMNS.into_iter().zip(data).collect();
    write_table(path, &columns)
}

/// Write a Strehl time series: a header of radii, then one row per frame
/// holding its 1-based index and its Strehl ratio at each radius.
pub fn write_strehl_series(
    path: &Path,
    radii: &[usize],
    rows: &[(usize, Vec<f64>)],
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(
        out,
        "# columns 2 and up are the pixel radii at which the Strehl ratio was computed"
    )?;

    let mut wtr = tab_writer(out);
    let header = std::iter::once("frameidx".to_string()).chain(radii.iter().map(usize::to_string));
    wtr.write_record(header)?;
    for (idx, ratios) in rows {
        if ratios.len() != radii.len() {
            return Err(StrehlError::RadiusMismatch {
                frame: ratios.len(),
                psf: radii.len(),
            });
        }
        let record = std::iter::once(idx.to_string()).chain(ratios.iter().map(|r| r.to_string()));
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), frames = rows.len(), "Wrote Strehl series");
    Ok(())
}
