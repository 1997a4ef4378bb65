//! Circular and annular pixel masks.
//!
//! A pixel at (row, col) has its center at coordinate (x = col, y = row).
//! Only the bounding box around the circle is visited; every pixel outside
//! it stays false.

use ndarray::Array2;

/// Build a boolean mask of `shape` (rows, cols) that is true where
/// `inner_radius² <= d² <= outer_radius²`, with `d` measured from `center`
/// given as `(x, y)`.
///
/// Never fails: an outer radius of zero, or a center far off the grid,
/// simply yields a mask with few or no true pixels.
pub fn circular_mask(
    shape: (usize, usize),
    center: (f64, f64),
    outer_radius: f64,
    inner_radius: f64,
) -> Array2<bool> {
    let (rows, cols) = shape;
    let mut mask = Array2::from_elem((rows, cols), false);
    if rows == 0 || cols == 0 || outer_radius < 0.0 {
        return mask;
    }

    let (cx, cy) = center;
    let outer_sq = outer_radius * outer_radius;
    let inner_sq = inner_radius * inner_radius;

    let Some((row_from, row_to)) = bounded_span(cy, outer_radius, rows) else {
        return mask;
    };
    let Some((col_from, col_to)) = bounded_span(cx, outer_radius, cols) else {
        return mask;
    };

    for row in row_from..=row_to {
        let dy2 = (row as f64 - cy).powi(2);
        for col in col_from..=col_to {
            let d2 = dy2 + (col as f64 - cx).powi(2);
            mask[[row, col]] = d2 <= outer_sq && d2 >= inner_sq;
        }
    }

    mask
}

/// Number of true pixels in a mask.
pub fn count(mask: &Array2<bool>) -> usize {
    mask.iter().filter(|&&m| m).count()
}

/// Inclusive index span `[floor(c - r), ceil(c + r)]` clipped to `0..len`.
fn bounded_span(c: f64, r: f64, len: usize) -> Option<(usize, usize)> {
    let lo = (c - r).floor();
    let hi = (c + r).ceil();
    if hi < 0.0 || lo > (len - 1) as f64 {
        return None;
    }
    let lo = lo.max(0.0) as usize;
    let hi = (hi as usize).min(len - 1);
    Some((lo, hi))
}
