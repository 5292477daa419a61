//! VTPKit command line
//!
//! Usage:
//!   vtpkit --config vtp.toml
//!   vtpkit --input part.gcode --regions regions.stl --functions equations.txt [options]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use vtpkit::{
    init_logging, ClassificationZ, ErrorPolicy, ExtrusionCalibration, ProcessingSummary,
    VtpConfig, VtpProcessor, BUILD_DATE, VERSION,
};

/// Rewrite sliced G-code for variable thickness printing
#[derive(Parser, Debug)]
#[command(name = "vtpkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON); flags below override it
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Input G-code file
    #[arg(short, long, value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output G-code file (default: <input>.vtp.gcode)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Region source: STL mesh (one region per body) or .toml/.json manifest
    #[arg(long, value_name = "FILE")]
    regions: Option<PathBuf>,

    /// Region function file, one `vStar; hStar` line per region
    #[arg(long, value_name = "FILE")]
    functions: Option<PathBuf>,

    /// Bead width as a multiple of the nozzle diameter
    #[arg(long)]
    alpha: Option<f64>,

    /// Nozzle diameter in mm
    #[arg(long)]
    nozzle_diameter: Option<f64>,

    /// Filament diameter in mm
    #[arg(long)]
    filament_diameter: Option<f64>,

    /// Maximum length of a refined infill sub-move in mm
    #[arg(long)]
    eval_increment: Option<f64>,

    /// Nominal extrusion rate
    #[arg(long)]
    e_dot: Option<f64>,

    /// Constant Z shift for adjusted moves in mm
    #[arg(long, allow_hyphen_values = true)]
    z_offset: Option<f64>,

    /// Feed rate for generated Z travel moves in mm/min
    #[arg(long)]
    travel_speed: Option<f64>,

    /// Keep nozzle-check lines instead of dropping them
    #[arg(long)]
    keep_nozzle_check: bool,

    /// Abort on the first line that fails instead of passing it through
    #[arg(long)]
    strict: bool,

    /// Z used to classify infill sub-moves (current, below-layer)
    #[arg(long, value_name = "POLICY")]
    classification_z: Option<ClassificationZ>,

    /// Extrusion correction (none, empirical, or a fixed multiplier)
    #[arg(long, value_name = "CALIBRATION")]
    extrusion_calibration: Option<ExtrusionCalibration>,

    /// Write logs to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Transform without writing the output file
    #[arg(long)]
    dry_run: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Configuration file settings with command line overrides applied
    fn build_config(&self) -> Result<VtpConfig> {
        let mut config = match &self.config {
            Some(path) => VtpConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => VtpConfig::default(),
        };

        let paths = &mut config.paths;
        for (target, value) in [
            (&mut paths.input, &self.input),
            (&mut paths.output, &self.output),
            (&mut paths.regions, &self.regions),
            (&mut paths.functions, &self.functions),
        ] {
            if let Some(path) = value {
                *target = Some(path.clone());
            }
        }

        let printing = &mut config.printing;
        for (target, value) in [
            (&mut printing.alpha, self.alpha),
            (&mut printing.nozzle_diameter, self.nozzle_diameter),
            (&mut printing.filament_diameter, self.filament_diameter),
            (&mut printing.eval_increment, self.eval_increment),
            (&mut printing.e_dot, self.e_dot),
            (&mut printing.z_offset, self.z_offset),
            (&mut printing.travel_speed, self.travel_speed),
        ] {
            if let Some(value) = value {
                *target = value;
            }
        }

        let options = &mut config.options;
        if self.keep_nozzle_check {
            options.remove_nozzle_check = false;
        }
        if self.strict {
            options.error_policy = ErrorPolicy::Strict;
        }
        if let Some(policy) = self.classification_z {
            options.classification_z = policy;
        }
        if let Some(calibration) = self.extrusion_calibration {
            options.extrusion_calibration = calibration;
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(summary: &ProcessingSummary) {
    let stats = &summary.stats;
    println!("Input:    {}", summary.input.display());
    match &summary.output {
        Some(output) => println!("Output:   {}", output.display()),
        None => println!("Output:   (dry run, nothing written)"),
    }
    println!(
        "Regions:  {}    layer height: {:.3} mm",
        summary.region_count, summary.layer_height
    );
    println!(
        "Lines:    {} in, {} out",
        stats.input_lines, stats.output_lines
    );
    println!(
        "Infill:   {} lines refined into {} moves",
        stats.infill_lines_expanded, stats.generated_moves
    );
    println!("Travel:   {} Z moves", stats.travel_moves_collapsed);
    println!(
        "Dropped:  {} nozzle checks, {} bare Z moves",
        stats.nozzle_checks_dropped, stats.bare_z_moves_dropped
    );

    if summary.is_degraded() {
        println!(
            "Degraded: {} lines passed through unchanged after errors",
            summary.issues.len()
        );
        for issue in &summary.issues {
            println!("  line {}: {}", issue.line_number, issue.error);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref(), cli.verbose)?;
    info!("VTPKit {} (built {})", VERSION, BUILD_DATE);

    let config = cli.build_config()?;
    let summary = VtpProcessor::new(config)
        .with_dry_run(cli.dry_run)
        .run()
        .context("Processing failed")?;

    print_summary(&summary);
    Ok(())
}
