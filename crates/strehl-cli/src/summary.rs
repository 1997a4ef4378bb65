use console::Style;
use strehl_core::pipeline::config::AnalysisConfig;
use strehl_core::pipeline::ReferencePsf;
use strehl_core::strehl::StrehlResult;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    dim: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            dim: Style::new().dim().yellow(),
        }
    }
}

fn rule(len: usize) -> String {
    "\u{2550}".repeat(len)
}

pub fn print_reference_summary(config: &AnalysisConfig, reference: &ReferencePsf) {
    let s = Styles::new();
    let optics = &config.optics;

    println!();
    println!("  {}", s.title.apply_to("Reference PSF"));
    println!("  {}", s.title.apply_to(rule(13)));
    println!();

    println!("  {}", s.header.apply_to("Optics"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Aperture"),
        s.value.apply_to(format!(
            "{} m (secondary {} m), f/{}",
            optics.primary, optics.secondary, optics.f_number
        ))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Wavelength"),
        s.value.apply_to(format!("{} nm", optics.lambda_mean))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Grid"),
        s.value.apply_to(format!(
            "{} px, pupil radius {:.1} px",
            optics.dimension,
            optics.pupil_radius_px()
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Calibration"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Plate scale"),
        s.value
            .apply_to(format!("{:.5} arcsec/px", reference.scale.plate_scale))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("First minimum"),
        s.value
            .apply_to(format!("{:.3} px", reference.scale.min_radius_real))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Resample"),
        s.value
            .apply_to(format!("{:.5}x", reference.scale.scale_to_physical))
    );
    println!();

    println!("  {}", s.header.apply_to("Curve of Growth"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Photometry"),
        s.method.apply_to(&config.photometry)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Normalize at"),
        s.value.apply_to(format!("{:.2} px", reference.max_extent_px))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Radii"),
        s.value.apply_to(format!(
            "1..{:.0} step {} (max aperture {:.0} px)",
            reference.growth_max, reference.step, reference.max_aperture_radius
        ))
    );
    if let Ok(growth) = reference.psf.require_growth() {
        if !growth.skipped.is_empty() {
            println!(
                "    {:<16}{}",
                s.label.apply_to("Skipped"),
                s.dim.apply_to(format!("{:?}", growth.skipped))
            );
        }
    }
    println!();
}

pub fn print_strehl_result(result: &StrehlResult) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Strehl Ratio"));
    println!(
        "    {:>6}  {:>8}  {:>14}  {:>14}  {:>8}",
        s.label.apply_to("Radius"),
        s.label.apply_to("Pixels"),
        s.label.apply_to("Flux"),
        s.label.apply_to("Ideal"),
        s.label.apply_to("Strehl")
    );
    for i in 0..result.len() {
        println!(
            "    {:>6}  {:>8}  {:>14.2}  {:>14.2}  {:>8}",
            result.radii[i],
            result.npix[i],
            result.fluxes[i],
            result.ideal_fluxes[i],
            s.value.apply_to(format!("{:.4}", result.strehl[i]))
        );
    }
    println!(
        "    {:<16}{}",
        s.label.apply_to("Scale factor"),
        s.value.apply_to(format!("{:.4e}", result.scale_factor))
    );
    println!();
}
