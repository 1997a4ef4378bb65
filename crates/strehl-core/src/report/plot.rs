//! SVG plots of curves of growth and radial profiles.
//!
//! Radius is plotted in detector pixels along the bottom axis and in
//! arcseconds along the top. The region inside the Airy first minimum is
//! shaded.

use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use crate::error::{Result, StrehlError};

const PLOT_SIZE: (u32, u32) = (768, 512);

/// One line on a report plot.
pub struct Series<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
}

/// Plot settings shared by the growth and profile reports.
pub struct PlotSpec<'a> {
    pub title: &'a str,
    pub y_desc: &'a str,
    /// Last radius shown, in pixels.
    pub x_max: f64,
    /// Arcseconds per pixel.
    pub plate_scale: f64,
    /// Airy first minimum in pixels.
    pub min_radius_real: f64,
}

fn report_err<E: std::fmt::Display>(e: E) -> StrehlError {
    StrehlError::Report(e.to_string())
}

/// Draw `series` against `radii` (pixels) into an SVG file.
pub fn plot_with_arcseconds(
    path: &Path,
    spec: &PlotSpec,
    radii: &[usize],
    series: &[Series],
) -> Result<()> {
    let x_max = spec.x_max.max(2.0);
    let visible = |values: &[f64]| {
        radii
            .iter()
            .zip(values.iter())
            .filter(|(r, v)| **r as f64 <= x_max && v.is_finite())
            .map(|(&r, &v)| (r as f64, v))
            .collect::<Vec<_>>()
    };

    let points: Vec<Vec<(f64, f64)>> = series.iter().map(|s| visible(s.values)).collect();
    let (y_min, y_max) = points
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
            (lo.min(v), hi.max(v))
        });
    let (y_min, y_max) = if y_min.is_finite() && y_max > y_min {
        let pad = (y_max - y_min) * 0.05;
        (y_min.min(0.0) - pad, y_max + pad)
    } else {
        (0.0, 1.0)
    };

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(report_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 18))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .set_label_area_size(LabelAreaPosition::Top, 40)
        .margin(10)
        .build_cartesian_2d(1.0..x_max, y_min..y_max)
        .map_err(report_err)?
        .set_secondary_coord(spec.plate_scale..x_max * spec.plate_scale, y_min..y_max);

    chart
        .configure_mesh()
        .x_desc("Radius (pixels)")
        .y_desc(spec.y_desc)
        .draw()
        .map_err(report_err)?;
    chart
        .configure_secondary_axes()
        .x_desc("Radius (arcseconds)")
        .y_labels(0)
        .draw()
        .map_err(report_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(1.0, y_min), (spec.min_radius_real.clamp(1.0, x_max), y_max)],
            BLUE.mix(0.1).filled(),
        )))
        .map_err(report_err)?;

    let colors = [RED, BLUE, GREEN, MAGENTA];
    for ((s, pts), &color) in series.iter().zip(points).zip(colors.iter().cycle()) {
        chart
            .draw_series(LineSeries::new(pts, color))
            .map_err(report_err)?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(report_err)?;

    root.present().map_err(report_err)?;
    debug!(path = %path.display(), series = series.len(), "Wrote plot");
    Ok(())
}
