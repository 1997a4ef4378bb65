use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::bias::avgrow_median_subtract;
use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::detection::StarFinder;
use crate::error::{Result, StrehlError};
use crate::frame::{Center, Frame};
use crate::photometry::{curve_of_growth, AperturePhotometer};
use crate::profile::profile_from_growthcurve;
use crate::strehl::combine;

use super::reference::ReferencePsf;
use super::types::{FrameAnalysis, PipelineStage, ProgressReporter, StrehlSeries};

/// Analyze one observed frame against the reference PSF.
///
/// The rows within `max_extent_px` of the center are excluded from the
/// bias estimate so the source does not bias it.
pub fn analyze_frame(
    reference: &ReferencePsf,
    data: Array2<f64>,
    center: Center,
    photometer: &dyn AperturePhotometer,
) -> Result<FrameAnalysis> {
    let mut frame = Frame::new(data, Some(center));

    let (exclude_from, exclude_to) = center.ybounds(reference.max_extent_px as usize);
    avgrow_median_subtract(&mut frame, exclude_from, exclude_to)?;
    debug!(exclude_from, exclude_to, "Bias band removed");

    curve_of_growth(&mut frame, reference.growth_max, reference.step, photometer)?;
    profile_from_growthcurve(&mut frame)?;
    let result = combine(&frame, &reference.psf, reference.max_extent_px)?;

    debug!(
        x = center.x,
        y = center.y,
        scale_factor = result.scale_factor,
        "Frame analyzed"
    );
    Ok(FrameAnalysis { frame, result })
}

/// Locate the brightest source in `data` and analyze the frame around it.
pub fn analyze_frame_found(
    reference: &ReferencePsf,
    data: Array2<f64>,
    finder: &dyn StarFinder,
    photometer: &dyn AperturePhotometer,
) -> Result<FrameAnalysis> {
    let source = finder.brightest(&data)?;
    debug!(x = source.x, y = source.y, mag = source.mag, "Brightest source");
    analyze_frame(reference, data, Center::new(source.x, source.y), photometer)
}

/// Strehl ratio per radius for selected frames of a cube.
///
/// `frame_indices` are 1-based. Each frame gets its own brightest-source
/// center. Frames are independent; above a small count they are analyzed
/// in parallel. Rows come back in the order of `frame_indices`.
pub fn analyze_series(
    reference: &ReferencePsf,
    cube: &ArrayView3<f64>,
    frame_indices: &[usize],
    finder: &dyn StarFinder,
    photometer: &dyn AperturePhotometer,
    reporter: &dyn ProgressReporter,
) -> Result<StrehlSeries> {
    if frame_indices.is_empty() {
        return Err(StrehlError::EmptySequence);
    }
    let total = cube.len_of(Axis(0));
    if let Some(&bad) = frame_indices.iter().find(|&&i| i == 0 || i > total) {
        return Err(StrehlError::FrameIndexOutOfRange { index: bad, total });
    }

    info!(
        frames = frame_indices.len(),
        finder = finder.name(),
        photometer = photometer.name(),
        "Analyzing frame series"
    );
    reporter.begin_stage(PipelineStage::AnalyzingFrames, Some(frame_indices.len()));

    let done = AtomicUsize::new(0);
    let analyze = |&index: &usize| -> Result<(usize, Vec<f64>)> {
        let data = cube.index_axis(Axis(0), index - 1).to_owned();
        let analysis = analyze_frame_found(reference, data, finder, photometer)?;
        let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
        reporter.advance(completed);
        debug!(frame = index, "Frame complete");
        Ok((index, analysis.result.strehl))
    };

    let rows = if frame_indices.len() >= PARALLEL_FRAME_THRESHOLD {
        frame_indices
            .par_iter()
            .map(analyze)
            .collect::<Result<Vec<_>>>()?
    } else {
        frame_indices
            .iter()
            .map(analyze)
            .collect::<Result<Vec<_>>>()?
    };
    reporter.finish_stage();

    Ok(StrehlSeries {
        radii: reference.radii().to_vec(),
        rows,
    })
}
