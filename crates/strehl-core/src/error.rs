use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrehlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Table error: {0}")]
    Table(#[from] csv::Error),

    #[error("Expected a 2-dimensional image, got {ndim} axes. Is this a data cube?")]
    Dimensionality { ndim: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("No first minimum found in the central row of a {dimension}px PSF; increase the dimension")]
    FirstMinimumNotFound { dimension: usize },

    #[error("Curve of growth extent {growth_max:.2}px won't fit on PSF frame (max aperture {max_aperture:.2}px)")]
    GrowthExceedsPsf { growth_max: f64, max_aperture: f64 },

    #[error("Invalid optical configuration: {0}")]
    InvalidOptics(String),

    #[error("Invalid range spec '{0}' (expected e.g. '1-10,20-30')")]
    InvalidRange(String),

    #[error("File pattern '{0}' must contain $i where the frame number goes")]
    InvalidPattern(String),

    #[error("Invalid exclusion band {from}..{to} for an image with {rows} rows")]
    InvalidBand { from: i64, to: i64, rows: usize },

    #[error("Frame has no center")]
    MissingCenter,

    #[error("Frame has no {0}; compute it first")]
    MissingProduct(&'static str),

    #[error("Radius series mismatch: frame has {frame} radii, PSF has {psf} (step and max aperture must match)")]
    RadiusMismatch { frame: usize, psf: usize },

    #[error("No radii within the normalization extent of {0:.2}px")]
    NoNormalizationRadius(f64),

    #[error("Ideal PSF has zero flux within the normalization extent")]
    ZeroReferenceFlux,

    #[error("No source detected by {0}")]
    NoSourceFound(String),

    #[error("External photometry failed: {0}")]
    ExternalPhotometry(String),

    #[error("Exposure error: {0}")]
    Exposure(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, StrehlError>;
