#![allow(dead_code)]

use ndarray::{Array2, Array3, Axis};

/// Circular Gaussian of peak `amp` and width `sigma` at `(x, y)`.
pub fn gaussian_blob(h: usize, w: usize, x: f64, y: f64, sigma: f64, amp: f64) -> Array2<f64> {
    let inv_2s2 = 1.0 / (2.0 * sigma * sigma);
    Array2::from_shape_fn((h, w), |(r, c)| {
        let d2 = (c as f64 - x).powi(2) + (r as f64 - y).powi(2);
        amp * (-d2 * inv_2s2).exp()
    })
}

/// Add a pattern that is constant down each column, as left by readout.
pub fn add_column_bias(data: &mut Array2<f64>, offset: f64, slope: f64) {
    for mut row in data.axis_iter_mut(Axis(0)) {
        for (c, v) in row.iter_mut().enumerate() {
            *v += offset + slope * c as f64;
        }
    }
}

/// Cube whose frame `i` (0-based) is filled with `i + 1`.
pub fn numbered_cube(frames: usize, h: usize, w: usize) -> Array3<f64> {
    Array3::from_shape_fn((frames, h, w), |(i, _, _)| (i + 1) as f64)
}

/// Cube of identical Gaussian stars drifting one pixel right per frame.
pub fn drifting_star_cube(frames: usize, size: usize) -> Array3<f64> {
    let mut cube = Array3::<f64>::zeros((frames, size, size));
    let mid = size as f64 / 2.0;
    for (i, mut plane) in cube.axis_iter_mut(Axis(0)).enumerate() {
        plane.assign(&gaussian_blob(size, size, mid - 2.0 + i as f64, mid, 1.5, 500.0));
    }
    cube
}
