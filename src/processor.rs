//! Processing pipeline
//!
//! Ties the pieces together for one run: load regions and their functions,
//! read the input program, pick up layer dimensions from its header, build
//! the extrusion model, transform, and write the result.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vtpkit_core::{ConfigError, ExtrusionModel, Result, VtpConfig};
use vtpkit_gcode::{
    read_gcode_lines, write_gcode_lines, LayerInfo, LineIssue, TransformReport, TransformStats,
    Transformer,
};
use vtpkit_regions::{RegionTable, Solid};

/// Outcome of a completed run
#[derive(Debug)]
pub struct ProcessingSummary {
    pub input: PathBuf,
    /// Where the output was written; `None` on a dry run
    pub output: Option<PathBuf>,
    /// Layer height the pass ran with
    pub layer_height: f64,
    pub region_count: usize,
    pub stats: TransformStats,
    /// Lines passed through unchanged because they failed
    pub issues: Vec<LineIssue>,
}

impl ProcessingSummary {
    /// Whether the run completed with recovered per-line failures
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Runs a configured VTP pass over a G-code file
pub struct VtpProcessor {
    config: VtpConfig,
    dry_run: bool,
}

impl VtpProcessor {
    pub fn new(config: VtpConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Transform without writing the output file
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the whole pipeline
    pub fn run(&self) -> Result<ProcessingSummary> {
        self.config.validate()?;
        let paths = &self.config.paths;
        let regions_path = required(paths.regions.as_deref(), "regions")?;
        let functions_path = required(paths.functions.as_deref(), "functions")?;
        let input = required(paths.input.as_deref(), "input")?;
        let output = required(paths.output_path().as_deref(), "output")?.to_path_buf();

        let regions = RegionTable::load(regions_path, functions_path)?;
        for (id, region) in regions.iter().enumerate() {
            debug!(
                "Region {}: {}, vStar = {}, hStar = {}",
                id,
                region.solid.describe(),
                region.functions.v_star,
                region.functions.h_star
            );
        }
        let lines = read_gcode_lines(input)?;
        info!("Processing {} ({} lines)", input.display(), lines.len());

        let (model, report) = self.process_lines(&regions, &lines)?;
        for issue in &report.issues {
            debug!("Recovered issue at line {}: {}", issue.line_number, issue.error);
        }
        if report.is_degraded() {
            warn!(
                "{} lines passed through unchanged after errors",
                report.issues.len()
            );
        }

        let written = if self.dry_run {
            info!("Dry run, not writing {}", output.display());
            None
        } else {
            write_gcode_lines(&output, &report.lines)?;
            info!("Wrote {}", output.display());
            Some(output)
        };

        Ok(ProcessingSummary {
            input: input.to_path_buf(),
            output: written,
            layer_height: model.params().layer_height,
            region_count: regions.len(),
            stats: report.stats,
            issues: report.issues,
        })
    }

    /// Transform an in-memory program against an already loaded region table
    ///
    /// Layer height and width come from the program header when present and
    /// from the configured parameters otherwise.
    pub fn process_lines<S: AsRef<str>>(
        &self,
        regions: &RegionTable,
        lines: &[S],
    ) -> Result<(ExtrusionModel, TransformReport)> {
        let header = LayerInfo::scan(lines);
        debug!(
            "Header layer height {:?}, layer width {:?}",
            header.layer_height, header.layer_width
        );

        let params = self
            .config
            .printing
            .with_layer_info(header.layer_height, header.layer_width);
        let model = ExtrusionModel::new(params, self.config.options.extrusion_calibration)?;
        debug!(
            "Extrusion model: filament area {:.4}, thread area {:.4}, calibration {:.4}",
            model.fil_area(),
            model.thread_area(),
            model.calibration()
        );

        let transformer = Transformer::new(&model, regions, self.config.options);
        let report = transformer.transform(lines)?;
        Ok((model, report))
    }
}

fn required<'a>(path: Option<&'a Path>, name: &str) -> Result<&'a Path> {
    path.ok_or_else(|| ConfigError::Invalid(format!("no {} file given", name)).into())
}
