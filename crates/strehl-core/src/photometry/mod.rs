//! Curve-of-growth aperture photometry.
//!
//! The growth loop is shared; how flux inside one aperture is measured is
//! delegated to an [`AperturePhotometer`], selected by [`PhotometryMode`].

pub mod external;
pub mod mask_sum;

use std::sync::Arc;

use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::{Center, CurveOfGrowth, Frame};
use crate::pipeline::config::PhotometryMode;

pub use external::ExternalPhotometer;
pub use mask_sum::MaskSum;

/// Flux and pixel count inside one aperture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApertureMeasurement {
    pub flux: f64,
    pub npix: usize,
    /// Fitted background per pixel, when the photometer fits one.
    pub sky: Option<f64>,
}

/// A way of measuring enclosed flux.
pub trait AperturePhotometer: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare to measure apertures on `data`. Any resources the session
    /// holds are released when it is dropped.
    fn open<'a>(&'a self, data: &'a Array2<f64>) -> Result<Box<dyn ApertureSession + 'a>>;
}

/// Measurements against one image.
pub trait ApertureSession {
    /// Measure the aperture of `radius` around `center`. `None` when the
    /// aperture encloses no pixels.
    fn measure(&mut self, center: Center, radius: f64) -> Result<Option<ApertureMeasurement>>;
}

/// Build the photometer for a configured mode.
pub fn create_photometer(mode: &PhotometryMode) -> Arc<dyn AperturePhotometer> {
    match mode {
        PhotometryMode::MaskSum => Arc::new(MaskSum),
        PhotometryMode::External(cfg) => Arc::new(ExternalPhotometer::new(cfg.clone())),
    }
}

/// Integrate flux in circular apertures of growing radius around the
/// frame's center and store the result on the frame.
///
/// Radii start at 1 and grow by `step` while `radius <= max_aperture`.
/// An aperture enclosing no pixels is skipped and the radius advances by
/// one instead of `step`. The engine does not clip `max_aperture` to the
/// frame; apertures reaching past the edge only count pixels on the grid.
pub fn curve_of_growth<'f>(
    frame: &'f mut Frame,
    max_aperture: f64,
    step: usize,
    photometer: &dyn AperturePhotometer,
) -> Result<&'f CurveOfGrowth> {
    let center = frame.require_center()?;
    let step = step.max(1);
    let mut growth = CurveOfGrowth::default();

    {
        let mut session = photometer.open(&frame.data)?;
        let mut radius = 1usize;
        while radius as f64 <= max_aperture {
            match session.measure(center, radius as f64)? {
                None => {
                    warn!(radius, "Skipping radius: aperture enclosed no pixels");
                    growth.skipped.push(radius);
                    radius += 1;
                }
                Some(m) => {
                    debug!(radius, flux = m.flux, npix = m.npix, "Aperture measured");
                    growth.radii.push(radius);
                    growth.fluxes.push(m.flux);
                    growth.npix.push(m.npix);
                    growth.sky.push(m.sky);
                    radius += step;
                }
            }
        }
    }

    debug!(
        photometer = photometer.name(),
        radii = growth.len(),
        skipped = growth.skipped.len(),
        "Curve of growth complete"
    );
    frame.profile = None;
    Ok(frame.growth.insert(growth))
}
