//! Brightest-source finding with a DAOFIND-style matched filter.
//!
//! The image is convolved with a zero-sum Gaussian of the expected FWHM,
//! which cancels any flat background. Local maxima of the response above
//! `threshold × sigma × ‖kernel‖` are candidates; each is centroided on
//! the background-subtracted image and given an instrumental magnitude.

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::bias::median;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, StrehlError};
use crate::pipeline::config::DetectionConfig;

/// FWHM = 2·sqrt(2·ln 2)·sigma.
const FWHM_TO_SIGMA: f64 = 2.354_820_045;

/// A detected source. Coordinates are 0-based, `x` the column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectedSource {
    pub x: f64,
    pub y: f64,
    /// Instrumental magnitude, `-2.5 log10(flux)`.
    pub mag: f64,
    /// 1-based detection order.
    pub id: usize,
}

/// Locates point sources in an image.
pub trait StarFinder: Send + Sync {
    fn name(&self) -> &str;

    /// All detections, brightest first.
    fn find(&self, data: &Array2<f64>) -> Result<Vec<DetectedSource>>;

    /// The detection with the smallest magnitude.
    fn brightest(&self, data: &Array2<f64>) -> Result<DetectedSource> {
        self.find(data)?
            .into_iter()
            .min_by(|a, b| a.mag.total_cmp(&b.mag))
            .ok_or_else(|| StrehlError::NoSourceFound(self.name().to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct PeakFinder {
    pub fwhm: f64,
    /// Detection threshold in units of image sigma.
    pub threshold: f64,
}

impl PeakFinder {
    pub fn new(fwhm: f64, threshold: f64) -> Self {
        Self { fwhm, threshold }
    }
}

impl From<&DetectionConfig> for PeakFinder {
    fn from(cfg: &DetectionConfig) -> Self {
        Self::new(cfg.fwhm, cfg.threshold)
    }
}

impl StarFinder for PeakFinder {
    fn name(&self) -> &str {
        "peak finder"
    }

    fn find(&self, data: &Array2<f64>) -> Result<Vec<DetectedSource>> {
        let (h, w) = data.dim();
        let n = (h * w) as f64;
        if n == 0.0 {
            return Ok(Vec::new());
        }
        let mean = data.sum() / n;
        let sigma = (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if !(sigma > 0.0) {
            debug!("Image has no variance; nothing to detect");
            return Ok(Vec::new());
        }
        let background = median(&mut data.iter().copied().collect::<Vec<_>>());

        let kernel = ZeroSumGaussian::new(self.fwhm);
        let cutoff = self.threshold * sigma * kernel.norm;
        let response = if h * w >= PARALLEL_PIXEL_THRESHOLD {
            convolve_parallel(data, &kernel)
        } else {
            convolve_sequential(data, &kernel)
        };

        let peaks = local_maxima(&response, kernel.radius, cutoff);
        let mut sources: Vec<DetectedSource> = peaks
            .into_iter()
            .filter_map(|(row, col)| centroid_window(data, row, col, kernel.radius, background))
            .enumerate()
            .map(|(i, (x, y, flux))| DetectedSource {
                x,
                y,
                mag: -2.5 * flux.log10(),
                id: i + 1,
            })
            .collect();
        sources.sort_by(|a, b| a.mag.total_cmp(&b.mag));

        debug!(
            sigma,
            background,
            cutoff,
            found = sources.len(),
            "Source detection complete"
        );
        Ok(sources)
    }
}

struct ZeroSumGaussian {
    weights: Array2<f64>,
    radius: usize,
    /// sqrt of the summed squared weights.
    norm: f64,
}

impl ZeroSumGaussian {
    fn new(fwhm: f64) -> Self {
        let sigma = (fwhm / FWHM_TO_SIGMA).max(0.5);
        let radius = ((2.0 * sigma).ceil() as usize).max(1);
        let size = 2 * radius + 1;
        let inv_2s2 = 1.0 / (2.0 * sigma * sigma);

        let mut weights = Array2::from_shape_fn((size, size), |(ky, kx)| {
            let dy = ky as f64 - radius as f64;
            let dx = kx as f64 - radius as f64;
            (-(dx * dx + dy * dy) * inv_2s2).exp()
        });
        let kmean = weights.sum() / (size * size) as f64;
        weights.mapv_inplace(|v| v - kmean);
        let norm = weights.iter().map(|v| v * v).sum::<f64>().sqrt();

        Self {
            weights,
            radius,
            norm,
        }
    }

    /// Filter response at `(row, col)`; zero where the kernel leaves the image.
    fn response_at(&self, data: &Array2<f64>, row: usize, col: usize) -> f64 {
        let (h, w) = data.dim();
        let r = self.radius;
        if row < r || col < r || row + r >= h || col + r >= w {
            return 0.0;
        }
        let window = data.slice(ndarray::s![row - r..=row + r, col - r..=col + r]);
        window
            .iter()
            .zip(self.weights.iter())
            .map(|(d, k)| d * k)
            .sum()
    }
}

fn convolve_sequential(data: &Array2<f64>, kernel: &ZeroSumGaussian) -> Array2<f64> {
    Array2::from_shape_fn(data.dim(), |(row, col)| kernel.response_at(data, row, col))
}

/// Row-parallel convolution using Rayon.
fn convolve_parallel(data: &Array2<f64>, kernel: &ZeroSumGaussian) -> Array2<f64> {
    let (h, w) = data.dim();
    let rows: Vec<Vec<f64>> = (0..h)
        .into_par_iter()
        .map(|row| (0..w).map(|col| kernel.response_at(data, row, col)).collect())
        .collect();

    let mut out = Array2::<f64>::zeros((h, w));
    for (row, values) in out.axis_iter_mut(Axis(0)).zip(rows) {
        for (dst, v) in row.into_iter().zip(values) {
            *dst = v;
        }
    }
    out
}

/// Pixels above `cutoff` that beat their 8 neighbours. On a plateau the
/// first pixel in raster order wins.
fn local_maxima(response: &Array2<f64>, margin: usize, cutoff: f64) -> Vec<(usize, usize)> {
    let (h, w) = response.dim();
    let lo = margin + 1;
    let mut peaks = Vec::new();
    if h < 2 * lo + 1 || w < 2 * lo + 1 {
        return peaks;
    }

    for row in lo..h - lo {
        for col in lo..w - lo {
            let c = response[[row, col]];
            if c <= cutoff {
                continue;
            }
            let is_max = (0..3).all(|dr| {
                (0..3).all(|dc| {
                    let (nr, nc) = (row + dr - 1, col + dc - 1);
                    let n = response[[nr, nc]];
                    match (nr, nc).cmp(&(row, col)) {
                        std::cmp::Ordering::Less => c > n,
                        std::cmp::Ordering::Greater => c >= n,
                        std::cmp::Ordering::Equal => true,
                    }
                })
            });
            if is_max {
                peaks.push((row, col));
            }
        }
    }
    peaks
}

/// Intensity-weighted centroid of positive background-subtracted values in
/// a square window. Returns `(x, y, flux)`, or `None` without positive flux.
fn centroid_window(
    data: &Array2<f64>,
    row: usize,
    col: usize,
    radius: usize,
    background: f64,
) -> Option<(f64, f64, f64)> {
    let (h, w) = data.dim();
    let (r0, r1) = (row.saturating_sub(radius), (row + radius).min(h - 1));
    let (c0, c1) = (col.saturating_sub(radius), (col + radius).min(w - 1));

    let (mut sx, mut sy, mut flux) = (0.0, 0.0, 0.0);
    for r in r0..=r1 {
        for c in c0..=c1 {
            let v = data[[r, c]] - background;
            if v > 0.0 {
                sx += c as f64 * v;
                sy += r as f64 * v;
                flux += v;
            }
        }
    }
    (flux > 0.0).then(|| (sx / flux, sy / flux, flux))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_star(h: usize, w: usize, x: f64, y: f64, amp: f64) -> Array2<f64> {
        Array2::from_shape_fn((h, w), |(r, c)| {
            let d2 = (c as f64 - x).powi(2) + (r as f64 - y).powi(2);
            amp * (-d2 / 4.0).exp()
        })
    }

    #[test]
    fn test_kernel_is_zero_sum() {
        let k = ZeroSumGaussian::new(2.5);
        assert!(k.weights.sum().abs() < 1e-12);
        assert!(k.norm > 0.0);
    }

    #[test]
    fn test_brightest_of_two() {
        let data = gaussian_star(48, 48, 12.0, 30.0, 50.0) + gaussian_star(48, 48, 34.0, 14.0, 200.0);
        let finder = PeakFinder::new(2.5, 3.0);
        let best = finder.brightest(&data).unwrap();
        assert!((best.x - 34.0).abs() < 0.5);
        assert!((best.y - 14.0).abs() < 0.5);
        assert_eq!(finder.find(&data).unwrap().len(), 2);
    }

    #[test]
    fn test_flat_image_has_no_source() {
        let data = Array2::from_elem((32, 32), 7.0);
        let err = PeakFinder::new(2.5, 3.0).brightest(&data).unwrap_err();
        assert!(matches!(err, StrehlError::NoSourceFound(_)));
    }
}
