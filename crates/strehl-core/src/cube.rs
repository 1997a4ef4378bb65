//! Operations on data cubes (`[frames, rows, cols]`).
//!
//! Frame indices in range specs are 1-based and inclusive.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use tracing::{debug, info, warn};

use crate::bias::{avgrow_median_subtract, median};
use crate::consts::EXPOSURE_RATIO_TOLERANCE;
use crate::error::{Result, StrehlError};
use crate::frame::Frame;

/// Parse `"a-b,c-d"` into inclusive 1-based pairs. A bare `"n"` is `n-n`.
pub fn parse_ranges(spec: &str) -> Result<Vec<(usize, usize)>> {
    let invalid = || StrehlError::InvalidRange(spec.to_string());
    let mut ranges = Vec::new();
    for part in spec.split(',').map(str::trim) {
        let (a, b) = match part.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (part, part),
        };
        let from: usize = a.parse().map_err(|_| invalid())?;
        let to: usize = b.parse().map_err(|_| invalid())?;
        if from == 0 || to < from {
            return Err(invalid());
        }
        ranges.push((from, to));
    }
    Ok(ranges)
}

/// Flatten range pairs into 1-based frame indices, checked against the cube.
pub fn range_indices(ranges: &[(usize, usize)], total: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for &(from, to) in ranges {
        if to > total {
            return Err(StrehlError::FrameIndexOutOfRange { index: to, total });
        }
        indices.extend(from..=to);
    }
    Ok(indices)
}

fn plane<'a>(cube: &'a ArrayView3<'_, f64>, index: usize) -> ArrayView2<'a, f64> {
    cube.index_axis(Axis(0), index - 1)
}

/// Copy out every frame named by `ranges`, paired with its 1-based index.
pub fn split_frames(
    cube: &ArrayView3<f64>,
    ranges: &[(usize, usize)],
) -> Result<Vec<(usize, Array2<f64>)>> {
    let indices = range_indices(ranges, cube.len_of(Axis(0)))?;
    Ok(indices
        .into_iter()
        .map(|i| (i, plane(cube, i).to_owned()))
        .collect())
}

/// Sum the frames of each range into one plane per range.
pub fn sum_ranges(cube: &ArrayView3<f64>, ranges: &[(usize, usize)]) -> Result<Vec<Array2<f64>>> {
    let total = cube.len_of(Axis(0));
    ranges
        .iter()
        .map(|&(from, to)| {
            if to > total {
                return Err(StrehlError::FrameIndexOutOfRange { index: to, total });
            }
            let sum = cube
                .slice(ndarray::s![from - 1..to, .., ..])
                .sum_axis(Axis(0));
            debug!(from, to, "Summed frame range");
            Ok(sum)
        })
        .collect()
}

/// Per-pixel median along the frame axis.
pub fn median_frame(cube: &ArrayView3<f64>) -> Result<Array2<f64>> {
    let frames = cube.len_of(Axis(0));
    if frames == 0 {
        return Err(StrehlError::EmptySequence);
    }
    let (_, h, w) = cube.dim();
    let mut out = Array2::<f64>::zeros((h, w));
    let mut column = Vec::with_capacity(frames);
    for ((row, col), dst) in out.indexed_iter_mut() {
        column.clear();
        column.extend(cube.slice(ndarray::s![.., row, col]).iter().copied());
        *dst = median(&mut column);
    }
    Ok(out)
}

/// Divide every frame by `flat`.
pub fn flat_field(cube: &ArrayView3<f64>, flat: &Array2<f64>) -> Result<Array3<f64>> {
    let (_, h, w) = cube.dim();
    if flat.dim() != (h, w) {
        return Err(StrehlError::ShapeMismatch {
            expected: (h, w),
            actual: flat.dim(),
        });
    }
    let mut out = cube.to_owned();
    for mut frame in out.axis_iter_mut(Axis(0)) {
        Zip::from(&mut frame).and(flat).for_each(|v, &f| *v /= f);
    }
    Ok(out)
}

/// Sum consecutive runs of short exposures to approximate a longer one.
///
/// Each output frame is the sum of `trunc(new_exposure / old_exposure)`
/// input frames, taken from `from..=to` (1-based; `to = None` means the
/// last frame). Frames left over at the end of the range are dropped.
pub fn average_to_exposure(
    cube: &ArrayView3<f64>,
    old_exposure: f64,
    new_exposure: f64,
    from: usize,
    to: Option<usize>,
) -> Result<Array3<f64>> {
    let total = cube.len_of(Axis(0));
    if new_exposure <= old_exposure {
        return Err(StrehlError::Exposure(format!(
            "cannot get a shorter exposure by combining frames ({old_exposure} > {new_exposure})"
        )));
    }
    let ratio = new_exposure / old_exposure;
    let per_combined = ratio.trunc() as usize;
    if ratio - ratio.trunc() > EXPOSURE_RATIO_TOLERANCE {
        warn!(
            ratio,
            per_combined, "New exposure is not an integer multiple of the old one; rounding down"
        );
    }
    if per_combined < 2 {
        return Err(StrehlError::Exposure(
            "only one input frame per combined frame".into(),
        ));
    }
    if total < 2 {
        return Err(StrehlError::Exposure(
            "only one frame found; is this a data cube?".into(),
        ));
    }

    let to = to.unwrap_or(total);
    if to > total {
        return Err(StrehlError::FrameIndexOutOfRange { index: to, total });
    }
    if from == 0 || from > to {
        return Err(StrehlError::InvalidRange(format!("{from}-{to}")));
    }

    let in_range = to - from + 1;
    let leftover = in_range % per_combined;
    if leftover != 0 {
        warn!(
            in_range,
            per_combined, leftover, "Frames at the end of the range will be left off"
        );
    }
    let combined = in_range / per_combined;
    if combined == 0 {
        return Err(StrehlError::Exposure(format!(
            "range of {in_range} frames is shorter than one combined exposure"
        )));
    }
    info!(
        combined,
        new_exposure, from, "Combining frames into longer exposures"
    );

    let ranges: Vec<(usize, usize)> = (0..combined)
        .map(|n| {
            let start = from + n * per_combined;
            (start, start + per_combined - 1)
        })
        .collect();
    let planes = sum_ranges(cube, &ranges)?;

    let (_, h, w) = cube.dim();
    let mut out = Array3::<f64>::zeros((combined, h, w));
    for (mut dst, src) in out.axis_iter_mut(Axis(0)).zip(&planes) {
        dst.assign(src);
    }
    Ok(out)
}

/// Row-bias correct a single frame with the band `[exclude_from, exclude_to)`.
pub fn remove_band_frame(
    data: Array2<f64>,
    exclude_from: i64,
    exclude_to: i64,
) -> Result<Array2<f64>> {
    let mut frame = Frame::new(data, None);
    avgrow_median_subtract(&mut frame, exclude_from, exclude_to)?;
    Ok(frame.data)
}

/// Row-bias correct every frame of a cube.
pub fn remove_band_cube(
    cube: &ArrayView3<f64>,
    exclude_from: i64,
    exclude_to: i64,
) -> Result<Array3<f64>> {
    let mut out = cube.to_owned();
    let total = out.len_of(Axis(0));
    for (idx, mut dst) in out.axis_iter_mut(Axis(0)).enumerate() {
        debug!(frame = idx + 1, total, "Removing band");
        let corrected = remove_band_frame(dst.to_owned(), exclude_from, exclude_to)?;
        dst.assign(&corrected);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranges() {
        assert_eq!(parse_ranges("1-10,20-30").unwrap(), vec![(1, 10), (20, 30)]);
        assert_eq!(parse_ranges("7").unwrap(), vec![(7, 7)]);
        assert!(parse_ranges("").is_err());
        assert!(parse_ranges("0-3").is_err());
        assert!(parse_ranges("5-2").is_err());
        assert!(parse_ranges("a-b").is_err());
    }

    #[test]
    fn test_range_indices_bounds() {
        assert_eq!(range_indices(&[(2, 3), (5, 5)], 5).unwrap(), vec![2, 3, 5]);
        assert!(range_indices(&[(4, 6)], 5).is_err());
    }
}
