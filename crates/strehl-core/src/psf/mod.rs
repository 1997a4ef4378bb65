pub mod scale;
pub mod synth;

pub use scale::{compute_psf_scale, generate_scaled_psf, PsfScale, ScaledPsf};
pub use synth::{first_min_from_core, generate_psf_full, generate_pupil};
