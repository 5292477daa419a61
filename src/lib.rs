//! # VTPKit
//!
//! A variable thickness printing (VTP) post-processor for sliced G-code.
//! The object is divided into regions, each with a pair of functions over
//! (x, y, z) controlling bead height and speed; infill moves are refined and
//! rewritten with region dependent Z, extrusion and feed rate.
//!
//! ## Architecture
//!
//! VTPKit is organized as a workspace with multiple crates:
//!
//! 1. **vtpkit-core** - Errors, printing parameters, extrusion model, config
//! 2. **vtpkit-regions** - Solids, STL and manifest loading, expression
//!    functions, region classification
//! 3. **vtpkit-gcode** - Move codec, line tagging, refiner, stream transformer
//! 4. **vtpkit** - Processing pipeline and command line binary

pub mod processor;

pub use processor::{ProcessingSummary, VtpProcessor};

pub use vtpkit_core::{
    ClassificationZ, Error, ErrorPolicy, ExtrusionCalibration, ExtrusionModel, FilePaths,
    PrintingParameters, ProcessingOptions, Result, VtpConfig,
};
pub use vtpkit_gcode::{LayerInfo, LineIssue, TransformReport, TransformStats, Transformer};
pub use vtpkit_regions::{FunctionTable, RegionLookup, RegionTable};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, `info` by default (`debug` when
///   `verbose`)
/// - Console output on stdout, or plain text appended to `log_file`
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> anyhow::Result<()> {
    use anyhow::Context;
    use std::fs::OpenOptions;
    use std::sync::Mutex;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            let fmt_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        None => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}
