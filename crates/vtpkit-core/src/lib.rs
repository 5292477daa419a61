//! # VTPKit Core
//!
//! Core types shared by the VTPKit crates: the error taxonomy, printing
//! parameters with their derived extrusion model, processing policies, and
//! the configuration file model.

pub mod config;
pub mod error;
pub mod options;
pub mod params;

pub use config::{FilePaths, VtpConfig};
pub use error::{ConfigError, Error, EvaluationError, GeometryError, ParseError, Result};
pub use options::{ClassificationZ, ErrorPolicy, ExtrusionCalibration, ProcessingOptions};
pub use params::{circle_area, ExtrusionModel, PrintingParameters, SegmentOutput};
