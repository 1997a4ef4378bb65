/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 206_265.0;

/// Airy first-minimum coefficient: theta = asin(1.22 * lambda / D).
pub const AIRY_FIRST_MIN_COEFF: f64 = 1.22;

/// Default ratio of PSF grid dimension to pupil radius (in grid pixels).
/// 512 px grids get a 32 px pupil radius, which puts the synthetic first
/// minimum near 10 px from the core.
pub const DEFAULT_PUPIL_GRID_RATIO: f64 = 16.0;

/// Default radius (arcseconds) beyond which flux measurements are mostly noise.
/// Used to normalize the ideal PSF against an observed frame.
pub const DEFAULT_NORMALIZATION_ARCSEC: f64 = 2.5;

/// Curve-of-growth steps taken beyond the normalization extent.
pub const DEFAULT_STEPS_BEYOND_EXTENT: usize = 3;

/// Default curve-of-growth radius step in pixels.
pub const DEFAULT_GROWTH_STEP: usize = 1;

/// Default PSF synthesis grid dimension.
pub const DEFAULT_PSF_DIMENSION: usize = 512;

/// Default star-finder FWHM estimate in pixels.
pub const DEFAULT_FWHM_PSF: f64 = 2.5;

/// Default star-finder detection threshold in units of background sigma.
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 20.0;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default sky annulus gap beyond the measuring aperture, in pixels.
pub const DEFAULT_SKY_ANNULUS_GAP: f64 = 5.0;

/// Default sky annulus width, in pixels.
pub const DEFAULT_SKY_ANNULUS_WIDTH: f64 = 5.0;

/// Profile plots stop at this radius (pixels).
pub const PROFILE_PLOT_MAX_RADIUS: f64 = 10.0;

/// Exposure ratios further than this from an integer trigger a rounding warning.
pub const EXPOSURE_RATIO_TOLERANCE: f64 = 0.01;
