//! Strehl ratio per radius from an observed frame and the ideal PSF.

use tracing::debug;

use crate::error::{Result, StrehlError};
use crate::frame::Frame;

/// Observed and ideal series aligned on the same aperture radii.
#[derive(Clone, Debug, PartialEq)]
pub struct StrehlResult {
    pub radii: Vec<usize>,
    pub npix: Vec<usize>,
    pub fluxes: Vec<f64>,
    /// PSF curve of growth scaled to the frame's total flux.
    pub ideal_fluxes: Vec<f64>,
    pub strehl: Vec<f64>,
    pub profile: Vec<f64>,
    /// PSF brightness profile scaled to the frame's total flux.
    pub ideal_profile: Vec<f64>,
    pub scale_factor: f64,
}

impl StrehlResult {
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Strehl ratio at the largest radius not beyond `radius`.
    pub fn strehl_at(&self, radius: usize) -> Option<f64> {
        self.radii
            .iter()
            .rposition(|&r| r <= radius)
            .map(|i| self.strehl[i])
    }
}

/// Combine a frame with the reference PSF frame.
///
/// Both frames must carry a curve of growth and a radial profile measured
/// at the same radii. The PSF is normalized so that its largest enclosed
/// flux within `max_extent_px` matches the frame's.
pub fn combine(frame: &Frame, psf: &Frame, max_extent_px: f64) -> Result<StrehlResult> {
    let growth = frame.require_growth()?;
    let profile = frame.require_profile()?;
    let psf_growth = psf.require_growth()?;
    let psf_profile = psf.require_profile()?;

    if growth.radii != psf_growth.radii {
        return Err(StrehlError::RadiusMismatch {
            frame: growth.len(),
            psf: psf_growth.len(),
        });
    }

    let frame_max = growth
        .max_flux_within(max_extent_px)
        .ok_or(StrehlError::NoNormalizationRadius(max_extent_px))?;
    let psf_max = psf_growth
        .max_flux_within(max_extent_px)
        .ok_or(StrehlError::NoNormalizationRadius(max_extent_px))?;
    if psf_max == 0.0 {
        return Err(StrehlError::ZeroReferenceFlux);
    }
    let scale_factor = frame_max / psf_max;

    let ideal_fluxes: Vec<f64> = psf_growth.fluxes.iter().map(|f| f * scale_factor).collect();
    let ideal_profile: Vec<f64> = psf_profile
        .brightness
        .iter()
        .map(|b| b * scale_factor)
        .collect();
    let strehl: Vec<f64> = growth
        .fluxes
        .iter()
        .zip(&ideal_fluxes)
        .map(|(f, ideal)| f / ideal)
        .collect();

    debug!(
        scale_factor,
        max_extent_px,
        radii = growth.len(),
        "Strehl series combined"
    );

    Ok(StrehlResult {
        radii: growth.radii.clone(),
        npix: growth.npix.clone(),
        fluxes: growth.fluxes.clone(),
        ideal_fluxes,
        strehl,
        profile: profile.brightness.clone(),
        ideal_profile,
        scale_factor,
    })
}
