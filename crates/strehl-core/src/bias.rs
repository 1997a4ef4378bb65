//! Row-correlated bias removal.
//!
//! Detector readout and charge leakage add a pattern that is constant down
//! each column. Averaging all rows outside the source band estimates that
//! pattern without letting the source bias it.

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use crate::error::{Result, StrehlError};
use crate::frame::Frame;

/// Column-wise mean of `frame.data` over every row outside
/// `[exclude_from, exclude_to)`. The band is clamped to the frame.
pub fn avgrow(frame: &Frame, exclude_from: i64, exclude_to: i64) -> Result<Array1<f64>> {
    average_row(&frame.data, exclude_from, exclude_to)
}

/// Reset `frame.data` from the original, subtract the average row from
/// every row, then subtract the global median.
pub fn avgrow_median_subtract(
    frame: &mut Frame,
    exclude_from: i64,
    exclude_to: i64,
) -> Result<&Array2<f64>> {
    frame.recorrect(|data| {
        let avg = average_row(data, exclude_from, exclude_to)?;
        *data -= &avg.insert_axis(Axis(0));
        let med = median(&mut data.iter().copied().collect::<Vec<_>>());
        data.mapv_inplace(|v| v - med);
        debug!(exclude_from, exclude_to, median = med, "Row bias removed");
        Ok(())
    })
}

fn average_row(data: &Array2<f64>, exclude_from: i64, exclude_to: i64) -> Result<Array1<f64>> {
    let rows = data.nrows();
    let invalid = || StrehlError::InvalidBand {
        from: exclude_from,
        to: exclude_to,
        rows,
    };
    // raw ends: clamping turns any band past the last row into an empty one
    if exclude_from > exclude_to {
        return Err(invalid());
    }
    let from = exclude_from.clamp(0, rows as i64) as usize;
    let to = exclude_to.clamp(0, rows as i64) as usize;
    if rows - (to - from) == 0 {
        return Err(invalid());
    }

    let mut sum = Array1::<f64>::zeros(data.ncols());
    for (row_idx, row) in data.axis_iter(Axis(0)).enumerate() {
        if row_idx < from || row_idx >= to {
            sum += &row;
        }
    }
    let kept = (rows - (to - from)) as f64;
    Ok(sum / kept)
}

/// Median of a slice, averaging the middle pair for even lengths.
/// Reorders the slice. NaN for an empty slice.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        f64::NAN
    } else if n % 2 == 1 {
        *values.select_nth_unstable_by(n / 2, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = values[mid];
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (lower + upper) / 2.0
    }
}
