pub mod config;
pub mod convert;
pub mod cube;
pub mod find_bright;
pub mod frame;
pub mod psf;
pub mod remove_band;
pub mod series;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use strehl_core::consts::{
    DEFAULT_DETECTION_THRESHOLD, DEFAULT_FWHM_PSF, DEFAULT_GROWTH_STEP, DEFAULT_PSF_DIMENSION,
};
use strehl_core::io::fits::FitsImage;
use strehl_core::pipeline::config::{
    AnalysisConfig, DetectionConfig, ExternalPhotometryConfig, GrowthConfig, OpticalConfig,
    PhotometryMode,
};

/// Optics, growth and photometry flags shared by the analysis commands.
#[derive(Args)]
pub struct AnalysisArgs {
    /// Analysis config file (TOML); overrides the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// PSF synthesis grid dimension in pixels
    #[arg(long, default_value_t = DEFAULT_PSF_DIMENSION)]
    pub dimension: usize,

    /// Primary mirror diameter (m)
    #[arg(long, default_value = "1.0")]
    pub primary: f64,

    /// Secondary mirror diameter (m)
    #[arg(long, default_value = "0.3")]
    pub secondary: f64,

    /// Focal ratio
    #[arg(long, default_value = "15.0")]
    pub f_number: f64,

    /// Mean wavelength (nm)
    #[arg(long, default_value = "650.0")]
    pub lambda: f64,

    /// Detector pixel pitch (mm/px)
    #[arg(long, default_value = "0.0135")]
    pub pixel_scale: f64,

    /// Pupil radius in grid pixels (default: dimension / 16)
    #[arg(long)]
    pub pupil_radius: Option<f64>,

    /// Curve-of-growth radius step in pixels
    #[arg(long, default_value_t = DEFAULT_GROWTH_STEP)]
    pub step: usize,

    /// Normalization radius in pixels (default: 2.5 arcsec)
    #[arg(long)]
    pub normalize_at: Option<f64>,

    /// External aperture-photometry program (default: in-process mask sum)
    #[arg(long)]
    pub phot_program: Option<PathBuf>,

    /// Extra arguments passed before the per-aperture ones
    #[arg(long, allow_hyphen_values = true)]
    pub phot_arg: Vec<String>,

    /// Let the external program fit a sky annulus
    #[arg(long, requires = "phot_program")]
    pub fit_sky: bool,

    /// Star-finder FWHM estimate in pixels
    #[arg(long, default_value_t = DEFAULT_FWHM_PSF)]
    pub fwhm: f64,

    /// Star-finder threshold in units of image sigma
    #[arg(long, default_value_t = DEFAULT_DETECTION_THRESHOLD)]
    pub threshold: f64,
}

impl AnalysisArgs {
    pub fn load_config(&self) -> Result<AnalysisConfig> {
        let config: AnalysisConfig = if let Some(ref config_path) = self.config {
            let contents = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            toml::from_str(&contents).context("Invalid analysis config")?
        } else {
            self.build_config_from_args()
        };
        config.optics.validate()?;
        Ok(config)
    }

    fn build_config_from_args(&self) -> AnalysisConfig {
        let photometry = match self.phot_program {
            Some(ref program) => {
                let mut ext = ExternalPhotometryConfig::new(program);
                ext.args = self.phot_arg.clone();
                ext.fit_sky = self.fit_sky;
                PhotometryMode::External(ext)
            }
            None => PhotometryMode::MaskSum,
        };

        AnalysisConfig {
            photometry,
            optics: OpticalConfig {
                dimension: self.dimension,
                primary: self.primary,
                secondary: self.secondary,
                f_number: self.f_number,
                lambda_mean: self.lambda,
                pixel_scale: self.pixel_scale,
                pupil_radius: self.pupil_radius,
            },
            growth: GrowthConfig {
                step: self.step,
                normalize_at: self.normalize_at,
                ..Default::default()
            },
            detection: DetectionConfig {
                fwhm: self.fwhm,
                threshold: self.threshold,
            },
        }
    }
}

pub fn open_fits(path: &Path) -> Result<FitsImage> {
    FitsImage::open(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Open a FITS file that must hold a cube.
pub fn open_cube(path: &Path) -> Result<FitsImage> {
    let image = open_fits(path)?;
    if !image.is_cube() {
        bail!("{} is a single frame, not a data cube", path.display());
    }
    Ok(image)
}

/// `path` without its extension, for deriving output names.
pub fn stem_path(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// `<base><suffix>.fits`
pub fn fits_name(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    name.push(".fits");
    PathBuf::from(name)
}
