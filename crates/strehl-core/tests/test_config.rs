use strehl_core::pipeline::config::{
    AnalysisConfig, ExternalPhotometryConfig, OpticalConfig, PhotometryMode,
};
use strehl_core::pipeline::PipelineStage;

#[test]
fn test_default_config_toml_roundtrip() {
    let config = AnalysisConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: AnalysisConfig = toml::from_str(&text).unwrap();

    assert_eq!(parsed.optics, config.optics);
    assert_eq!(parsed.photometry, PhotometryMode::MaskSum);
    assert_eq!(parsed.growth.step, config.growth.step);
    assert_eq!(parsed.growth.normalize_at, None);
    assert_eq!(parsed.detection.threshold, config.detection.threshold);
}

#[test]
fn test_partial_toml_fills_defaults() {
    let text = r#"
[optics]
lambda_mean = 1650.0
primary = 3.0
secondary = 0.9

[growth]
normalize_at = 12.0
"#;
    let config: AnalysisConfig = toml::from_str(text).unwrap();
    assert_eq!(config.optics.lambda_mean, 1650.0);
    assert_eq!(config.optics.dimension, OpticalConfig::default().dimension);
    assert_eq!(config.growth.normalize_at, Some(12.0));
    assert_eq!(config.growth.steps_beyond, 3);
    assert_eq!(config.photometry, PhotometryMode::MaskSum);
    assert!(config.optics.validate().is_ok());
}

#[test]
fn test_external_photometry_from_toml() {
    let text = r#"
[photometry.External]
program = "/usr/local/bin/phot"
fit_sky = true
"#;
    let config: AnalysisConfig = toml::from_str(text).unwrap();
    let PhotometryMode::External(ext) = &config.photometry else {
        panic!("expected external photometry");
    };
    assert!(ext.fit_sky);
    assert_eq!(ext.annulus_gap, 5.0);
    assert!(ext.args.is_empty());
}

#[test]
fn test_optics_geometry() {
    let optics = OpticalConfig::default();
    assert_eq!(optics.pupil_radius_px(), 32.0);
    assert!((optics.obscuration_radius_px() - 9.6).abs() < 1e-12);
    assert_eq!(optics.focal_length_mm(), 15_000.0);

    let bad = OpticalConfig {
        pupil_radius: Some(300.0),
        ..OpticalConfig::default()
    };
    assert!(bad.validate().is_err());
}

#[test]
fn test_display_names() {
    assert_eq!(PhotometryMode::MaskSum.to_string(), "Mask Sum");
    let mut ext = ExternalPhotometryConfig::new("phot");
    ext.fit_sky = true;
    assert_eq!(
        PhotometryMode::External(ext).to_string(),
        "External (phot) with sky fitting"
    );
    assert_eq!(PipelineStage::MeasuringPsf.to_string(), "Measuring ideal PSF");
}
