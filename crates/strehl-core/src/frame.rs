use ndarray::{Array2, ArrayD, Ix2};

use crate::error::{Result, StrehlError};

/// Sub-pixel source position. `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Center {
    pub x: f64,
    pub y: f64,
}

impl Center {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn as_xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Row band `[y - r, y + r)` around the center, truncated to integers.
    pub fn ybounds(&self, r: usize) -> (i64, i64) {
        let y = self.y as i64;
        (y - r as i64, y + r as i64)
    }
}

impl From<(f64, f64)> for Center {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Cumulative flux in growing circular apertures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveOfGrowth {
    /// Strictly increasing aperture radii (pixels).
    pub radii: Vec<usize>,
    /// Flux enclosed at each radius.
    pub fluxes: Vec<f64>,
    /// Pixels enclosed at each radius.
    pub npix: Vec<usize>,
    /// Background fitted at each radius, if the photometer fits one.
    pub sky: Vec<Option<f64>>,
    /// Radii that enclosed no pixels and were left out.
    pub skipped: Vec<usize>,
}

impl CurveOfGrowth {
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Largest enclosed flux among radii `<= max_radius`.
    pub fn max_flux_within(&self, max_radius: f64) -> Option<f64> {
        self.radii
            .iter()
            .zip(&self.fluxes)
            .filter(|(r, _)| **r as f64 <= max_radius)
            .map(|(_, &f)| f)
            .reduce(f64::max)
    }
}

/// Per-annulus flux derived from a curve of growth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialProfile {
    /// Flux added since the previous aperture.
    pub flux: Vec<f64>,
    /// Pixels added since the previous aperture.
    pub npix: Vec<usize>,
    /// Mean flux per pixel in each annulus (`flux / npix`).
    pub brightness: Vec<f64>,
    /// Annulus indices with no new pixels (brightness is NaN there).
    pub degenerate: Vec<usize>,
}

/// One image under analysis: the synthetic PSF or an observed frame.
///
/// `data` is the working copy and reflects the latest correction.
/// `original_data` never changes; every correction starts from it.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Array2<f64>,
    original_data: Array2<f64>,
    pub center: Option<Center>,
    pub growth: Option<CurveOfGrowth>,
    pub profile: Option<RadialProfile>,
}

impl Frame {
    pub fn new(data: Array2<f64>, center: Option<Center>) -> Self {
        Self {
            original_data: data.clone(),
            data,
            center,
            growth: None,
            profile: None,
        }
    }

    /// Build a frame from an array of unknown dimensionality.
    pub fn from_dyn(data: ArrayD<f64>, center: Option<Center>) -> Result<Self> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| StrehlError::Dimensionality { ndim })?;
        Ok(Self::new(data, center))
    }

    pub fn original_data(&self) -> &Array2<f64> {
        &self.original_data
    }

    /// Restore `data` from `original_data` and apply `correct` to it.
    ///
    /// Photometric products computed from the previous data are dropped.
    pub fn recorrect<F>(&mut self, correct: F) -> Result<&Array2<f64>>
    where
        F: FnOnce(&mut Array2<f64>) -> Result<()>,
    {
        let mut data = self.original_data.clone();
        correct(&mut data)?;
        self.data = data;
        self.growth = None;
        self.profile = None;
        Ok(&self.data)
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn require_center(&self) -> Result<Center> {
        self.center.ok_or(StrehlError::MissingCenter)
    }

    pub fn require_growth(&self) -> Result<&CurveOfGrowth> {
        self.growth
            .as_ref()
            .ok_or(StrehlError::MissingProduct("curve of growth"))
    }

    pub fn require_profile(&self) -> Result<&RadialProfile> {
        self.profile
            .as_ref()
            .ok_or(StrehlError::MissingProduct("radial profile"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_from_dyn_rejects_cube() {
        let cube = ArrayD::<f64>::zeros(IxDyn(&[3, 4, 4]));
        let err = Frame::from_dyn(cube, None).unwrap_err();
        assert!(matches!(err, StrehlError::Dimensionality { ndim: 3 }));
    }

    #[test]
    fn test_recorrect_starts_from_original() {
        let mut frame = Frame::new(Array2::from_elem((2, 2), 5.0), None);
        for _ in 0..3 {
            frame
                .recorrect(|d| {
                    d.mapv_inplace(|v| v - 1.0);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(frame.data[[0, 0]], 4.0);
        assert_eq!(frame.original_data()[[0, 0]], 5.0);
    }

    #[test]
    fn test_ybounds_truncates() {
        let c = Center::new(10.0, 32.7);
        assert_eq!(c.ybounds(5), (27, 37));
    }
}
