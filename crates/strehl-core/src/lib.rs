pub mod bias;
pub mod consts;
pub mod cube;
pub mod detection;
pub mod error;
pub mod frame;
pub mod io;
pub mod mask;
pub mod photometry;
pub mod pipeline;
pub mod profile;
pub mod psf;
pub mod report;
pub mod strehl;
