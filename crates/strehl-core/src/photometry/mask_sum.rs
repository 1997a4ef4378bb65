use ndarray::{Array2, Zip};

use crate::error::Result;
use crate::frame::Center;
use crate::mask::circular_mask;

use super::{ApertureMeasurement, AperturePhotometer, ApertureSession};

/// In-process photometry: a fresh circular mask per radius, summed over
/// the frame data.
pub struct MaskSum;

impl AperturePhotometer for MaskSum {
    fn name(&self) -> &str {
        "Mask Sum"
    }

    fn open<'a>(&'a self, data: &'a Array2<f64>) -> Result<Box<dyn ApertureSession + 'a>> {
        Ok(Box::new(MaskSumSession { data }))
    }
}

struct MaskSumSession<'a> {
    data: &'a Array2<f64>,
}

impl ApertureSession for MaskSumSession<'_> {
    fn measure(&mut self, center: Center, radius: f64) -> Result<Option<ApertureMeasurement>> {
        Ok(sum_in_aperture(self.data, center, radius))
    }
}

/// Sum of `data` within `radius` of `center`, or `None` for an empty aperture.
pub fn sum_in_aperture(
    data: &Array2<f64>,
    center: Center,
    radius: f64,
) -> Option<ApertureMeasurement> {
    let mask = circular_mask(data.dim(), center.as_xy(), radius, 0.0);

    let mut flux = 0.0f64;
    let mut npix = 0usize;
    Zip::from(data).and(&mask).for_each(|&value, &inside| {
        if inside {
            flux += value;
            npix += 1;
        }
    });

    (npix > 0).then_some(ApertureMeasurement {
        flux,
        npix,
        sky: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sum_equals_pixel_count() {
        let data = Array2::<f64>::ones((21, 21));
        let m = sum_in_aperture(&data, Center::new(10.0, 10.0), 3.0).unwrap();
        assert_eq!(m.flux, m.npix as f64);
        // 29 pixel centers lie within radius 3 of a lattice point
        assert_eq!(m.npix, 29);
    }

    #[test]
    fn test_off_grid_aperture_is_none() {
        let data = Array2::<f64>::ones((8, 8));
        assert!(sum_in_aperture(&data, Center::new(100.0, 100.0), 2.0).is_none());
    }
}
