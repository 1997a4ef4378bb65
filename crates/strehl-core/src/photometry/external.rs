//! File-mediated photometry through an external program.
//!
//! The frame is written to a FITS file in a private temporary directory and
//! the program is run once per aperture, leaving one result file per step.
//! The directory is removed when the session is dropped, whether the curve
//! of growth finished or failed.

use std::path::PathBuf;
use std::process::Command;

use ndarray::Array2;
use tempfile::TempDir;
use tracing::{debug, trace};

use crate::error::{Result, StrehlError};
use crate::frame::Center;
use crate::io::fits::write_fits;
use crate::pipeline::config::ExternalPhotometryConfig;

use super::{ApertureMeasurement, AperturePhotometer, ApertureSession};

pub struct ExternalPhotometer {
    config: ExternalPhotometryConfig,
}

impl ExternalPhotometer {
    pub fn new(config: ExternalPhotometryConfig) -> Self {
        Self { config }
    }
}

impl AperturePhotometer for ExternalPhotometer {
    fn name(&self) -> &str {
        "External"
    }

    fn open<'a>(&'a self, data: &'a Array2<f64>) -> Result<Box<dyn ApertureSession + 'a>> {
        let workdir = tempfile::Builder::new().prefix("strehl-phot").tempdir()?;
        let image = workdir.path().join("frame.fits");
        write_fits(&image, &data.view().into_dyn(), None)?;
        debug!(workdir = %workdir.path().display(), "External photometry session opened");
        Ok(Box::new(ExternalSession {
            config: &self.config,
            workdir,
            image,
            step: 0,
        }))
    }
}

struct ExternalSession<'a> {
    config: &'a ExternalPhotometryConfig,
    workdir: TempDir,
    image: PathBuf,
    step: usize,
}

impl ApertureSession for ExternalSession<'_> {
    fn measure(&mut self, center: Center, radius: f64) -> Result<Option<ApertureMeasurement>> {
        self.step += 1;
        let output = self.workdir.path().join(format!("step_{:04}.mag", self.step));

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(&self.image)
            .arg(center.x.to_string())
            .arg(center.y.to_string())
            .arg(radius.to_string())
            .arg(&output);
        if self.config.fit_sky {
            cmd.arg((radius + self.config.annulus_gap).to_string())
                .arg(self.config.annulus_width.to_string());
        }

        let result = cmd.output().map_err(|e| {
            StrehlError::ExternalPhotometry(format!(
                "failed to run {}: {e}",
                self.config.program.display()
            ))
        })?;
        if !result.status.success() {
            return Err(StrehlError::ExternalPhotometry(format!(
                "{} exited with {}: {}",
                self.config.program.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let text = std::fs::read_to_string(&output)?;
        let measurement = parse_phot_output(&text)?;
        trace!(radius, ?measurement, "External aperture result");
        Ok(measurement)
    }
}

/// Parse a result file: the first non-comment line holds
/// `flux npix [sky]`. Zero pixels means the aperture was empty.
pub fn parse_phot_output(text: &str) -> Result<Option<ApertureMeasurement>> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .ok_or_else(|| StrehlError::ExternalPhotometry("empty result file".into()))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    let bad = || StrehlError::ExternalPhotometry(format!("unparseable result line '{line}'"));
    if fields.len() < 2 {
        return Err(bad());
    }

    let flux: f64 = fields[0].parse().map_err(|_| bad())?;
    let npix: f64 = fields[1].parse().map_err(|_| bad())?;
    let sky = match fields.get(2) {
        Some(s) => Some(s.parse::<f64>().map_err(|_| bad())?),
        None => None,
    };

    if npix < 0.5 {
        return Ok(None);
    }
    Ok(Some(ApertureMeasurement {
        flux,
        npix: npix.round() as usize,
        sky,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_sky_and_comments() {
        let text = "# flux npix sky\n\n  1234.5  29  0.25\n";
        let m = parse_phot_output(text).unwrap().unwrap();
        assert_eq!(m.flux, 1234.5);
        assert_eq!(m.npix, 29);
        assert_eq!(m.sky, Some(0.25));
    }

    #[test]
    fn test_parse_zero_pixels_is_empty_aperture() {
        assert!(parse_phot_output("0.0 0\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_phot_output("").is_err());
        assert!(parse_phot_output("INDEF 12").is_err());
        assert!(parse_phot_output("12.0").is_err());
    }
}
