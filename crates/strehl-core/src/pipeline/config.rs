use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    AIRY_FIRST_MIN_COEFF, DEFAULT_DETECTION_THRESHOLD, DEFAULT_FWHM_PSF, DEFAULT_GROWTH_STEP,
    DEFAULT_PSF_DIMENSION, DEFAULT_PUPIL_GRID_RATIO, DEFAULT_SKY_ANNULUS_GAP,
    DEFAULT_SKY_ANNULUS_WIDTH, DEFAULT_STEPS_BEYOND_EXTENT,
};
use crate::error::{Result, StrehlError};

/// Full analysis configuration, loadable from TOML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub photometry: PhotometryMode,
    #[serde(default)]
    pub optics: OpticalConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Telescope and detector parameters. Fixed for a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalConfig {
    /// PSF synthesis grid dimension in pixels.
    pub dimension: usize,
    /// Primary mirror diameter (m).
    pub primary: f64,
    /// Secondary (central obscuration) diameter (m).
    pub secondary: f64,
    /// Focal ratio.
    pub f_number: f64,
    /// Mean wavelength (nm).
    pub lambda_mean: f64,
    /// Detector pixel pitch (mm/px).
    pub pixel_scale: f64,
    /// Pupil radius in synthesis-grid pixels. Defaults to `dimension / 16`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil_radius: Option<f64>,
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_PSF_DIMENSION,
            primary: 1.0,
            secondary: 0.3,
            f_number: 15.0,
            lambda_mean: 650.0,
            pixel_scale: 0.0135,
            pupil_radius: None,
        }
    }
}

impl OpticalConfig {
    /// Pupil (primary) radius in synthesis-grid pixels.
    pub fn pupil_radius_px(&self) -> f64 {
        self.pupil_radius
            .unwrap_or(self.dimension as f64 / DEFAULT_PUPIL_GRID_RATIO)
    }

    /// Central obscuration radius in synthesis-grid pixels.
    pub fn obscuration_radius_px(&self) -> f64 {
        self.pupil_radius_px() * self.secondary / self.primary
    }

    /// Focal length in millimetres.
    pub fn focal_length_mm(&self) -> f64 {
        self.f_number * self.primary * 1000.0
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("primary", self.primary),
            ("f_number", self.f_number),
            ("lambda_mean", self.lambda_mean),
            ("pixel_scale", self.pixel_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(StrehlError::InvalidOptics(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(0.0..self.primary).contains(&self.secondary) {
            return Err(StrehlError::InvalidOptics(format!(
                "secondary ({}) must be in [0, primary ({}))",
                self.secondary, self.primary
            )));
        }
        if AIRY_FIRST_MIN_COEFF * self.lambda_mean * 1e-9 / self.primary >= 1.0 {
            return Err(StrehlError::InvalidOptics(
                "wavelength too large for the aperture".into(),
            ));
        }
        let pupil = self.pupil_radius_px();
        if !(pupil >= 1.0 && 2.0 * pupil < self.dimension as f64) {
            return Err(StrehlError::InvalidOptics(format!(
                "pupil radius {pupil}px does not fit a {}px grid",
                self.dimension
            )));
        }
        Ok(())
    }
}

/// Curve-of-growth sampling.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Radius increment in pixels.
    #[serde(default = "default_growth_step")]
    pub step: usize,
    /// Normalization radius in pixels. `None` means 2.5 arcseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize_at: Option<f64>,
    /// Steps measured beyond the normalization radius.
    #[serde(default = "default_steps_beyond")]
    pub steps_beyond: usize,
}

fn default_growth_step() -> usize {
    DEFAULT_GROWTH_STEP
}
fn default_steps_beyond() -> usize {
    DEFAULT_STEPS_BEYOND_EXTENT
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_GROWTH_STEP,
            normalize_at: None,
            steps_beyond: DEFAULT_STEPS_BEYOND_EXTENT,
        }
    }
}

/// How flux inside each aperture is measured.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PhotometryMode {
    /// Sum the frame over an in-process circular mask.
    #[default]
    MaskSum,
    /// Delegate each aperture to an external photometry program.
    External(ExternalPhotometryConfig),
}

impl fmt::Display for PhotometryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaskSum => write!(f, "Mask Sum"),
            Self::External(cfg) => {
                write!(f, "External ({})", cfg.program.display())?;
                if cfg.fit_sky {
                    write!(f, " with sky fitting")?;
                }
                Ok(())
            }
        }
    }
}

/// External aperture-photometry program invocation.
///
/// The program is called once per radius as
/// `program [args..] <image> <x> <y> <radius> <output> [<annulus> <dannulus>]`
/// and must write `flux npix [sky]` to `<output>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalPhotometryConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Fit a local sky level per aperture.
    #[serde(default)]
    pub fit_sky: bool,
    /// Gap between the aperture and the sky annulus (pixels).
    #[serde(default = "default_annulus_gap")]
    pub annulus_gap: f64,
    /// Sky annulus width (pixels).
    #[serde(default = "default_annulus_width")]
    pub annulus_width: f64,
}

fn default_annulus_gap() -> f64 {
    DEFAULT_SKY_ANNULUS_GAP
}
fn default_annulus_width() -> f64 {
    DEFAULT_SKY_ANNULUS_WIDTH
}

impl ExternalPhotometryConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            fit_sky: false,
            annulus_gap: DEFAULT_SKY_ANNULUS_GAP,
            annulus_width: DEFAULT_SKY_ANNULUS_WIDTH,
        }
    }
}

/// Brightest-source finder parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// FWHM estimate of the stellar PSF (pixels).
    #[serde(default = "default_fwhm")]
    pub fwhm: f64,
    /// Detection threshold in units of background sigma.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_fwhm() -> f64 {
    DEFAULT_FWHM_PSF
}
fn default_threshold() -> f64 {
    DEFAULT_DETECTION_THRESHOLD
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fwhm: DEFAULT_FWHM_PSF,
            threshold: DEFAULT_DETECTION_THRESHOLD,
        }
    }
}
