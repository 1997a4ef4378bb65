//! Calibration of the synthetic PSF grid against real detector pixels.
//!
//! The synthetic PSF has an arbitrary pixel scale set by the pupil sampling.
//! Comparing its first Airy minimum with the theoretical one for the real
//! telescope gives the zoom factor that maps it onto detector pixels.

use ndarray::Array2;
use tracing::debug;

use crate::consts::{AIRY_FIRST_MIN_COEFF, ARCSEC_PER_RADIAN};
use crate::error::{Result, StrehlError};
use crate::pipeline::config::OpticalConfig;

use super::synth::{first_min_from_core, generate_psf_full};

/// Outputs of the scale calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PsfScale {
    /// Zoom factor from synthetic-grid pixels to detector pixels.
    pub scale_to_physical: f64,
    /// Arcseconds per detector pixel.
    pub plate_scale: f64,
    /// Radius of the first Airy minimum in detector pixels.
    pub min_radius_real: f64,
}

/// A PSF resampled to detector pixels.
#[derive(Clone, Debug)]
pub struct ScaledPsf {
    pub data: Array2<f64>,
    /// Intensity-weighted center `(x, y)`.
    pub centroid: (f64, f64),
    /// Largest aperture radius that fits on the grid (`rows / 2`).
    pub max_aperture_radius: f64,
}

/// Arcseconds per detector pixel.
pub fn plate_scale(optics: &OpticalConfig) -> f64 {
    ARCSEC_PER_RADIAN / optics.focal_length_mm() * optics.pixel_scale
}

/// Angular radius of the first Airy minimum, in arcseconds.
pub fn first_min_arcsec(optics: &OpticalConfig) -> f64 {
    let lambda_m = optics.lambda_mean * 1e-9;
    (AIRY_FIRST_MIN_COEFF * lambda_m / optics.primary).asin() * ARCSEC_PER_RADIAN
}

/// Derive the synthetic-to-physical zoom factor for an optical configuration.
///
/// Pure in its inputs; callers compute it once per configuration.
pub fn compute_psf_scale(optics: &OpticalConfig) -> Result<PsfScale> {
    optics.validate()?;

    let unscaled = generate_psf_full(optics.dimension, optics.pupil_radius_px(), 0.0);
    let first_min_px = first_min_from_core(&unscaled)?;
    let first_min_radius = (first_min_px - optics.dimension / 2) as f64;
    if first_min_radius <= 0.0 {
        return Err(StrehlError::FirstMinimumNotFound {
            dimension: optics.dimension,
        });
    }

    let plate_scale = plate_scale(optics);
    let min_radius_real = first_min_arcsec(optics) / plate_scale;
    let scale_to_physical = min_radius_real / first_min_radius;

    debug!(
        first_min_radius,
        plate_scale, min_radius_real, scale_to_physical, "PSF scale computed"
    );

    Ok(PsfScale {
        scale_to_physical,
        plate_scale,
        min_radius_real,
    })
}

/// Synthesize the obscured PSF and resample it onto detector pixels.
pub fn generate_scaled_psf(optics: &OpticalConfig, scale_to_physical: f64) -> Result<ScaledPsf> {
    let unscaled = generate_psf_full(
        optics.dimension,
        optics.pupil_radius_px(),
        optics.obscuration_radius_px(),
    );
    let data = zoom(&unscaled, scale_to_physical)?;
    let centroid = center_of_mass(&data);
    let max_aperture_radius = (data.nrows() / 2) as f64;

    debug!(
        rows = data.nrows(),
        cols = data.ncols(),
        max_aperture_radius,
        "Scaled PSF"
    );

    Ok(ScaledPsf {
        data,
        centroid,
        max_aperture_radius,
    })
}

/// Resample by `factor` with bilinear interpolation. Output corners map onto
/// input corners.
pub fn zoom(data: &Array2<f64>, factor: f64) -> Result<Array2<f64>> {
    let (h, w) = data.dim();
    let out_h = (h as f64 * factor).round() as usize;
    let out_w = (w as f64 * factor).round() as usize;
    if !(factor.is_finite() && factor > 0.0) || out_h < 2 || out_w < 2 {
        return Err(StrehlError::InvalidOptics(format!(
            "zoom factor {factor} gives a degenerate {out_w}x{out_h} PSF"
        )));
    }

    let sy = (h - 1) as f64 / (out_h - 1) as f64;
    let sx = (w - 1) as f64 / (out_w - 1) as f64;

    let mut result = Array2::<f64>::zeros((out_h, out_w));
    for ((row, col), value) in result.indexed_iter_mut() {
        *value = bilinear_sample(data, row as f64 * sy, col as f64 * sx);
    }
    Ok(result)
}

fn bilinear_sample(data: &Array2<f64>, y: f64, x: f64) -> f64 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let sample = |r: i64, c: i64| -> f64 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    sample(y0, x0) * (1.0 - fx) * (1.0 - fy)
        + sample(y0, x1) * fx * (1.0 - fy)
        + sample(y1, x0) * (1.0 - fx) * fy
        + sample(y1, x1) * fx * fy
}

/// Intensity-weighted center `(x, y)`; the geometric center for an empty image.
pub fn center_of_mass(data: &Array2<f64>) -> (f64, f64) {
    let (h, w) = data.dim();
    let mut sum_r = 0.0f64;
    let mut sum_c = 0.0f64;
    let mut sum_w = 0.0f64;

    for ((row, col), &weight) in data.indexed_iter() {
        sum_r += row as f64 * weight;
        sum_c += col as f64 * weight;
        sum_w += weight;
    }

    if sum_w > 0.0 {
        (sum_c / sum_w, sum_r / sum_w)
    } else {
        (w as f64 / 2.0, h as f64 / 2.0)
    }
}
