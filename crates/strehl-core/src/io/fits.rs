//! FITS primary-HDU images through cfitsio.
//!
//! Reads 2D frames and 3D cubes of any BITPIX (cfitsio applies
//! BZERO/BSCALE) and writes `BITPIX = -64` images.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use ndarray::{Array2, ArrayD, ArrayView3, ArrayViewD, Axis, Ix2, Ix3, IxDyn};
use tracing::debug;

use crate::error::{Result, StrehlError};

// cfitsio keeps global state unless built reentrant; calls are serialized.
static CFITSIO: Mutex<()> = Mutex::new(());

fn cfitsio_lock() -> MutexGuard<'static, ()> {
    CFITSIO.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A decoded primary HDU.
#[derive(Clone, Debug)]
pub struct FitsImage {
    /// Shape `[rows, cols]` for frames, `[frames, rows, cols]` for cubes.
    pub data: ArrayD<f64>,
    /// EXPOSURE (or EXPTIME) header value, in seconds.
    pub exposure: Option<f64>,
}

impl FitsImage {
    pub fn new(data: ArrayD<f64>, exposure: Option<f64>) -> Self {
        Self { data, exposure }
    }

    /// Open a FITS file and decode its primary image.
    pub fn open(path: &Path) -> Result<Self> {
        // keep a missing file an I/O error rather than a format error
        std::fs::metadata(path)?;
        let _guard = cfitsio_lock();
        let mut fptr = FitsFile::open(path)
            .map_err(|e| StrehlError::InvalidFits(format!("{}: {e}", path.display())))?;
        let hdu = fptr
            .primary_hdu()
            .map_err(|e| StrehlError::InvalidFits(format!("no primary HDU: {e}")))?;

        // cfitsio reports the shape with NAXIS1 last, matching array order.
        let shape = match &hdu.info {
            HduInfo::ImageInfo { shape, .. } => shape.clone(),
            _ => return Err(StrehlError::InvalidFits("primary HDU is not an image".into())),
        };
        if !(2..=3).contains(&shape.len()) {
            return Err(StrehlError::Dimensionality { ndim: shape.len() });
        }
        if shape.contains(&0) {
            return Err(StrehlError::InvalidFits("zero-length axis".into()));
        }

        let values: Vec<f64> = hdu.read_image(&mut fptr)?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| StrehlError::InvalidFits(e.to_string()))?;
        let exposure = read_key(&hdu, &mut fptr, "EXPOSURE")
            .or_else(|| read_key(&hdu, &mut fptr, "EXPTIME"));
        debug!(path = %path.display(), ?shape, ?exposure, "FITS image read");

        Ok(Self { data, exposure })
    }

    pub fn is_cube(&self) -> bool {
        self.data.ndim() == 3
    }

    /// Number of 2D planes (1 for a plain frame).
    pub fn frame_count(&self) -> usize {
        if self.is_cube() {
            self.data.shape()[0]
        } else {
            1
        }
    }

    /// View as a cube; errors for anything but 3 axes.
    pub fn cube(&self) -> Result<ArrayView3<'_, f64>> {
        self.data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| StrehlError::Dimensionality {
                ndim: self.data.ndim(),
            })
    }

    /// A single 2D plane, 0-based. A plain frame only has plane 0.
    pub fn plane(&self, index: usize) -> Result<Array2<f64>> {
        let total = self.frame_count();
        if index >= total {
            return Err(StrehlError::FrameIndexOutOfRange { index, total });
        }
        if self.is_cube() {
            let plane = self
                .data
                .index_axis(Axis(0), index)
                .into_dimensionality::<Ix2>()
                .map_err(|_| StrehlError::Dimensionality { ndim: 3 })?;
            Ok(plane.to_owned())
        } else {
            self.clone().into_frame_data()
        }
    }

    /// The image as a 2D frame; errors for cubes.
    pub fn into_frame_data(self) -> Result<Array2<f64>> {
        let ndim = self.data.ndim();
        self.data
            .into_dimensionality::<Ix2>()
            .map_err(|_| StrehlError::Dimensionality { ndim })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_fits(path, &self.data.view(), self.exposure)
    }
}

/// Read a FITS file that must hold a single 2D frame.
pub fn read_frame(path: &Path) -> Result<Array2<f64>> {
    FitsImage::open(path)?.into_frame_data()
}

/// Write `data` as a `BITPIX = -64` primary HDU, replacing any existing
/// file. The last array axis is NAXIS1.
pub fn write_fits(path: &Path, data: &ArrayViewD<f64>, exposure: Option<f64>) -> Result<()> {
    let description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: data.shape(),
    };
    let _guard = cfitsio_lock();
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .overwrite()
        .open()?;
    let hdu = fptr.primary_hdu()?;

    let values: Vec<f64> = data.iter().copied().collect();
    hdu.write_image(&mut fptr, &values)?;
    if let Some(exposure) = exposure {
        hdu.write_key(&mut fptr, "EXPOSURE", exposure)?;
    }
    debug!(path = %path.display(), shape = ?data.shape(), "FITS image written");
    Ok(())
}

fn read_key(hdu: &FitsHdu, fptr: &mut FitsFile, key: &str) -> Option<f64> {
    hdu.read_key(fptr, key).ok()
}
