use std::path::{Path, PathBuf};

use image::DynamicImage;
use ndarray::{Array2, Array3, Axis};
use num_traits::ToPrimitive;
use tracing::debug;

use crate::error::{Result, StrehlError};

/// Load a PNG or TIFF as raw grayscale values (no normalization).
///
/// 8- and 16-bit grayscale keep their stored counts; colour images are
/// converted to 16-bit luminance first.
pub fn load_image(path: &Path) -> Result<Array2<f64>> {
    let img = image::open(path)?;
    let data = match img {
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            gray_to_array(w, h, gray.as_raw())?
        }
        DynamicImage::ImageLuma16(gray) => {
            let (w, h) = gray.dimensions();
            gray_to_array(w, h, gray.as_raw())?
        }
        other => {
            let gray = other.to_luma16();
            let (w, h) = gray.dimensions();
            gray_to_array(w, h, gray.as_raw())?
        }
    };
    debug!(path = %path.display(), rows = data.nrows(), cols = data.ncols(), "Image loaded");
    Ok(data)
}

/// Load several same-sized images as the planes of a cube, in order.
pub fn load_image_stack(paths: &[impl AsRef<Path>]) -> Result<Array3<f64>> {
    let first = paths.first().ok_or(StrehlError::EmptySequence)?;
    let first = load_image(first.as_ref())?;
    let (h, w) = first.dim();

    let mut cube = Array3::<f64>::zeros((paths.len(), h, w));
    cube.index_axis_mut(Axis(0), 0).assign(&first);
    for (i, path) in paths.iter().enumerate().skip(1) {
        let plane = load_image(path.as_ref())?;
        if plane.dim() != (h, w) {
            return Err(StrehlError::ShapeMismatch {
                expected: (h, w),
                actual: plane.dim(),
            });
        }
        cube.index_axis_mut(Axis(0), i).assign(&plane);
    }
    Ok(cube)
}

/// Files in `dir` whose names match `pattern`, where `$i` stands for a
/// decimal frame number. Sorted by that number rather than lexically.
pub fn indexed_files(dir: &Path, pattern: &str) -> Result<Vec<(usize, PathBuf)>> {
    let (prefix, suffix) = pattern
        .split_once("$i")
        .ok_or_else(|| StrehlError::InvalidPattern(pattern.to_string()))?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let index = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<usize>().ok());
        if let Some(index) = index {
            files.push((index, path));
        }
    }
    files.sort();
    debug!(dir = %dir.display(), matched = files.len(), "Indexed image files");
    Ok(files)
}

fn gray_to_array<T: ToPrimitive + Copy>(w: u32, h: u32, raw: &[T]) -> Result<Array2<f64>> {
    let values: Vec<f64> = raw.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect();
    let len = values.len();
    Array2::from_shape_vec((h as usize, w as usize), values).map_err(|_| {
        StrehlError::ShapeMismatch {
            expected: (h as usize, w as usize),
            actual: (len / (w as usize).max(1), w as usize),
        }
    })
}
