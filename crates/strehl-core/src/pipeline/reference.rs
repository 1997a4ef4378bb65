use tracing::info;

use crate::consts::DEFAULT_NORMALIZATION_ARCSEC;
use crate::error::{Result, StrehlError};
use crate::frame::{Center, Frame};
use crate::photometry::{curve_of_growth, AperturePhotometer, MaskSum};
use crate::profile::profile_from_growthcurve;
use crate::psf::{compute_psf_scale, generate_scaled_psf, PsfScale};

use super::config::{AnalysisConfig, OpticalConfig};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// The ideal PSF for one optical configuration, measured once and shared
/// by every frame analyzed against it.
#[derive(Clone, Debug)]
pub struct ReferencePsf {
    pub optics: OpticalConfig,
    pub scale: PsfScale,
    /// Scaled PSF with its curve of growth and radial profile.
    pub psf: Frame,
    /// Radius (pixels) within which fluxes are normalized.
    pub max_extent_px: f64,
    /// Largest aperture radius measured.
    pub growth_max: f64,
    pub step: usize,
    /// Half the scaled PSF frame size.
    pub max_aperture_radius: f64,
}

impl ReferencePsf {
    /// Build with in-process photometry and no progress reporting.
    pub fn build(config: &AnalysisConfig) -> Result<Self> {
        Self::build_reported(config, &MaskSum, &NoOpReporter)
    }

    pub fn build_reported(
        config: &AnalysisConfig,
        photometer: &dyn AperturePhotometer,
        reporter: &dyn ProgressReporter,
    ) -> Result<Self> {
        let optics = &config.optics;

        reporter.begin_stage(PipelineStage::Calibrating, None);
        let scale = compute_psf_scale(optics)?;
        reporter.finish_stage();
        info!(
            plate_scale = scale.plate_scale,
            min_radius_real = scale.min_radius_real,
            scale_to_physical = scale.scale_to_physical,
            "Plate scale calibrated"
        );

        reporter.begin_stage(PipelineStage::SynthesizingPsf, None);
        let scaled = generate_scaled_psf(optics, scale.scale_to_physical)?;
        reporter.finish_stage();

        let step = config.growth.step.max(1);
        let max_extent_px = config
            .growth
            .normalize_at
            .unwrap_or(DEFAULT_NORMALIZATION_ARCSEC / scale.plate_scale);
        let growth_max = max_extent_px + (config.growth.steps_beyond * step) as f64;
        if growth_max >= scaled.max_aperture_radius {
            return Err(StrehlError::GrowthExceedsPsf {
                growth_max,
                max_aperture: scaled.max_aperture_radius,
            });
        }

        let (cx, cy) = scaled.centroid;
        let mut psf = Frame::new(scaled.data, Some(Center::new(cx, cy)));

        reporter.begin_stage(PipelineStage::MeasuringPsf, None);
        curve_of_growth(&mut psf, growth_max, step, photometer)?;
        profile_from_growthcurve(&mut psf)?;
        reporter.finish_stage();

        info!(
            max_extent_px,
            growth_max,
            max_aperture_radius = scaled.max_aperture_radius,
            photometer = photometer.name(),
            "Reference PSF measured"
        );

        Ok(Self {
            optics: optics.clone(),
            scale,
            psf,
            max_extent_px,
            growth_max,
            step,
            max_aperture_radius: scaled.max_aperture_radius,
        })
    }

    /// Aperture radii shared by every analysis against this PSF.
    pub fn radii(&self) -> &[usize] {
        self.psf
            .growth
            .as_ref()
            .map_or(&[], |g| g.radii.as_slice())
    }
}
