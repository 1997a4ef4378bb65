use tracing::warn;

use crate::error::Result;
use crate::frame::{Frame, RadialProfile};

/// Differentiate the frame's curve of growth into per-annulus flux, pixel
/// counts and mean brightness, and store the result on the frame.
///
/// Annuli that add no pixels get NaN brightness and are listed in
/// [`RadialProfile::degenerate`].
pub fn profile_from_growthcurve(frame: &mut Frame) -> Result<&RadialProfile> {
    let growth = frame.require_growth()?;
    let n = growth.len();

    let mut profile = RadialProfile {
        flux: Vec::with_capacity(n),
        npix: Vec::with_capacity(n),
        brightness: Vec::with_capacity(n),
        degenerate: Vec::new(),
    };

    let mut prev_flux = 0.0;
    let mut prev_npix = 0usize;
    for (i, (&flux, &npix)) in growth.fluxes.iter().zip(&growth.npix).enumerate() {
        let ring_flux = flux - prev_flux;
        let ring_npix = npix.saturating_sub(prev_npix);
        let brightness = if ring_npix == 0 {
            warn!(
                radius = growth.radii[i],
                "Annulus added no pixels; brightness undefined"
            );
            profile.degenerate.push(i);
            f64::NAN
        } else {
            ring_flux / ring_npix as f64
        };

        profile.flux.push(ring_flux);
        profile.npix.push(ring_npix);
        profile.brightness.push(brightness);
        prev_flux = flux;
        prev_npix = npix;
    }

    Ok(frame.profile.insert(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CurveOfGrowth;
    use ndarray::Array2;

    fn frame_with_growth(fluxes: Vec<f64>, npix: Vec<usize>) -> Frame {
        let mut frame = Frame::new(Array2::zeros((4, 4)), None);
        frame.growth = Some(CurveOfGrowth {
            radii: (1..=fluxes.len()).collect(),
            fluxes,
            npix,
            sky: Vec::new(),
            skipped: Vec::new(),
        });
        frame
    }

    #[test]
    fn test_differences_and_brightness() {
        let mut frame = frame_with_growth(vec![5.0, 14.0, 20.0], vec![5, 13, 29]);
        let p = profile_from_growthcurve(&mut frame).unwrap();
        assert_eq!(p.flux, vec![5.0, 9.0, 6.0]);
        assert_eq!(p.npix, vec![5, 8, 16]);
        assert_eq!(p.brightness, vec![1.0, 9.0 / 8.0, 6.0 / 16.0]);
        assert!(p.degenerate.is_empty());
    }

    #[test]
    fn test_zero_pixel_annulus_is_nan() {
        let mut frame = frame_with_growth(vec![5.0, 5.0], vec![5, 5]);
        let p = profile_from_growthcurve(&mut frame).unwrap();
        assert!(p.brightness[1].is_nan());
        assert_eq!(p.degenerate, vec![1]);
    }

    #[test]
    fn test_requires_growth() {
        let mut frame = Frame::new(Array2::zeros((4, 4)), None);
        assert!(profile_from_growthcurve(&mut frame).is_err());
    }
}
