mod common;

use ndarray::Array2;

use strehl_core::error::StrehlError;
use strehl_core::frame::{Center, Frame};
use strehl_core::photometry::{create_photometer, curve_of_growth, MaskSum};
use strehl_core::pipeline::config::PhotometryMode;
use strehl_core::profile::profile_from_growthcurve;

use common::gaussian_blob;

#[test]
fn test_growth_monotonic_for_non_negative_data() {
    let data = gaussian_blob(41, 41, 20.3, 19.6, 3.0, 100.0);
    let mut frame = Frame::new(data, Some(Center::new(20.3, 19.6)));
    let growth = curve_of_growth(&mut frame, 15.0, 1, &MaskSum).unwrap();

    assert_eq!(growth.radii, (1..=15).collect::<Vec<_>>());
    assert_eq!(growth.radii.len(), growth.fluxes.len());
    assert_eq!(growth.radii.len(), growth.npix.len());
    for i in 1..growth.len() {
        assert!(growth.fluxes[i] >= growth.fluxes[i - 1]);
        assert!(growth.npix[i] > growth.npix[i - 1]);
    }
    assert!(growth.skipped.is_empty());
}

#[test]
fn test_growth_step_and_max_aperture() {
    let data = Array2::<f64>::ones((32, 32));
    let mut frame = Frame::new(data, Some(Center::new(16.0, 16.0)));
    let growth = curve_of_growth(&mut frame, 10.5, 3, &MaskSum).unwrap();
    assert_eq!(growth.radii, vec![1, 4, 7, 10]);
    // uniform data: flux equals pixel count
    for (f, n) in growth.fluxes.iter().zip(&growth.npix) {
        assert_eq!(*f, *n as f64);
    }
}

#[test]
fn test_empty_apertures_are_skipped_by_one() {
    let data = Array2::<f64>::ones((8, 8));
    let mut frame = Frame::new(data, Some(Center::new(-1.5, -1.5)));
    let growth = curve_of_growth(&mut frame, 7.0, 2, &MaskSum).unwrap();

    // radius 1 and 2 fall short of pixel (0, 0) at distance 2.12
    assert_eq!(growth.skipped, vec![1, 2]);
    assert_eq!(growth.radii, vec![3, 5, 7]);
    assert_eq!(growth.npix[0], 3);
}

#[test]
fn test_growth_requires_center() {
    let mut frame = Frame::new(Array2::ones((8, 8)), None);
    let err = curve_of_growth(&mut frame, 3.0, 1, &MaskSum).unwrap_err();
    assert!(matches!(err, StrehlError::MissingCenter));
}

#[test]
fn test_profile_reconstructs_growth() {
    let data = gaussian_blob(41, 41, 20.0, 20.0, 2.0, 50.0);
    let mut frame = Frame::new(data, Some(Center::new(20.0, 20.0)));
    curve_of_growth(&mut frame, 12.0, 1, &MaskSum).unwrap();
    profile_from_growthcurve(&mut frame).unwrap();

    let growth = frame.growth.as_ref().unwrap();
    let profile = frame.profile.as_ref().unwrap();
    assert_eq!(profile.flux[0], growth.fluxes[0]);
    assert_eq!(profile.npix[0], growth.npix[0]);

    let mut running_flux = 0.0;
    let mut running_npix = 0;
    for i in 0..growth.len() {
        running_flux += profile.flux[i];
        running_npix += profile.npix[i];
        assert!((running_flux - growth.fluxes[i]).abs() < 1e-9);
        assert_eq!(running_npix, growth.npix[i]);
        assert!((profile.brightness[i] - profile.flux[i] / profile.npix[i] as f64).abs() < 1e-12);
    }
    // brightness falls off away from the core
    assert!(profile.brightness[0] > profile.brightness[5]);
}

#[test]
fn test_recorrection_clears_products() {
    let mut frame = Frame::new(Array2::ones((16, 16)), Some(Center::new(8.0, 8.0)));
    curve_of_growth(&mut frame, 4.0, 1, &MaskSum).unwrap();
    profile_from_growthcurve(&mut frame).unwrap();
    frame.recorrect(|_| Ok(())).unwrap();
    assert!(frame.growth.is_none());
    assert!(frame.profile.is_none());
}

#[test]
fn test_default_photometer_is_mask_sum() {
    let photometer = create_photometer(&PhotometryMode::default());
    assert_eq!(photometer.name(), "Mask Sum");
}

#[cfg(unix)]
mod external {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use ndarray::Array2;

    use strehl_core::error::StrehlError;
    use strehl_core::frame::{Center, Frame};
    use strehl_core::photometry::{curve_of_growth, ExternalPhotometer};
    use strehl_core::pipeline::config::ExternalPhotometryConfig;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("phot.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_external_program_per_radius() {
        let dir = tempfile::tempdir().unwrap();
        // args: image x y radius output; reports flux = 10 r, npix = 3 r^2 + 1
        let program = script(
            dir.path(),
            r##"test -f "$1" || exit 3
r=$4
echo "# flux npix" > "$5"
echo "$((r * 10)) $((r * r * 3 + 1))" >> "$5""##,
        );
        let photometer = ExternalPhotometer::new(ExternalPhotometryConfig::new(program));

        let mut frame = Frame::new(Array2::ones((16, 16)), Some(Center::new(8.0, 8.0)));
        let growth = curve_of_growth(&mut frame, 3.0, 1, &photometer).unwrap();
        assert_eq!(growth.radii, vec![1, 2, 3]);
        assert_eq!(growth.fluxes, vec![10.0, 20.0, 30.0]);
        assert_eq!(growth.npix, vec![4, 13, 28]);
        assert_eq!(growth.sky, vec![None; 3]);
    }

    #[test]
    fn test_external_sky_arguments() {
        let dir = tempfile::tempdir().unwrap();
        // with sky fitting the annulus radius and width follow the output path;
        // the fake program reports the annulus radius as its sky level
        let program = script(
            dir.path(),
            r#"test "$#" -eq 7 || exit 4
echo "1.0 5 $6" > "$5""#,
        );
        let mut config = ExternalPhotometryConfig::new(program);
        config.fit_sky = true;
        let photometer = ExternalPhotometer::new(config);

        let mut frame = Frame::new(Array2::ones((16, 16)), Some(Center::new(8.0, 8.0)));
        let growth = curve_of_growth(&mut frame, 2.0, 1, &photometer).unwrap();
        assert_eq!(growth.radii, vec![1, 2]);
        assert_eq!(growth.sky, vec![Some(6.0), Some(7.0)]);
    }

    #[test]
    fn test_external_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "echo broken >&2\nexit 1");
        let photometer = ExternalPhotometer::new(ExternalPhotometryConfig::new(program));

        let mut frame = Frame::new(Array2::ones((8, 8)), Some(Center::new(4.0, 4.0)));
        let err = curve_of_growth(&mut frame, 2.0, 1, &photometer).unwrap_err();
        match err {
            StrehlError::ExternalPhotometry(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error {other}"),
        }
        assert!(frame.growth.is_none());
    }
}
