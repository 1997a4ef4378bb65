use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use crate::error::{Result, StrehlError};
use crate::mask::circular_mask;

/// Circular aperture with optional central obscuration, centered at
/// `(dim/2, dim/2)`. Radii are in grid pixels.
pub fn generate_pupil(dim: usize, aperture_radius: f64, obscuration_radius: f64) -> Array2<f64> {
    let center = (dim / 2) as f64;
    circular_mask((dim, dim), (center, center), aperture_radius, obscuration_radius)
        .mapv(|inside| if inside { 1.0 } else { 0.0 })
}

/// Diffraction PSF of a pupil: `fftshift(|FFT2(pupil)|²)`, `dim × dim`.
pub fn generate_psf_full(dim: usize, aperture_radius: f64, obscuration_radius: f64) -> Array2<f64> {
    let pupil = generate_pupil(dim, aperture_radius, obscuration_radius);
    let spectrum = fft2d(&pupil);
    fftshift(&spectrum.mapv(|c| c.norm_sqr()))
}

/// Index of the first turning point (`row[i+1] > row[i]`) scanning the
/// central row outward from the midpoint. This is the Airy first minimum
/// when the grid samples the core finely enough.
pub fn first_min_from_core(psf: &Array2<f64>) -> Result<usize> {
    let dim = psf.nrows();
    if dim == 0 {
        return Err(StrehlError::FirstMinimumNotFound { dimension: dim });
    }
    let row = psf.row(dim / 2);
    let width = row.len();

    for i in dim / 2..width.saturating_sub(1) {
        if row[i + 1] > row[i] {
            debug!(
                radius_px = i - dim / 2,
                index = i,
                value = row[i],
                next = row[i + 1],
                "PSF turning point"
            );
            return Ok(i);
        }
    }

    Err(StrehlError::FirstMinimumNotFound { dimension: dim })
}

/// Move the zero-frequency component to the array center.
pub fn fftshift(data: &Array2<f64>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h, w));
    for row in 0..h {
        let dst_row = (row + h / 2) % h;
        for col in 0..w {
            let dst_col = (col + w / 2) % w;
            result[[dst_row, dst_col]] = data[[row, col]];
        }
    }
    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f64>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v, 0.0));

    for mut row in result.rows_mut() {
        let mut row_data: Vec<Complex<f64>> = row.to_vec();
        fft_row.process(&mut row_data);
        for (dst, src) in row.iter_mut().zip(row_data) {
            *dst = src;
        }
    }

    for mut col in result.columns_mut() {
        let mut col_data: Vec<Complex<f64>> = col.to_vec();
        fft_col.process(&mut col_data);
        for (dst, src) in col.iter_mut().zip(col_data) {
            *dst = src;
        }
    }

    result
}
