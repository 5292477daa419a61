//! Configuration file model
//!
//! A run is configured from a TOML or JSON file with three optional sections
//! (`[printing]`, `[options]`, `[paths]`); command line flags are layered on
//! top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::options::ProcessingOptions;
use crate::params::PrintingParameters;

/// File locations for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePaths {
    /// Region source (STL mesh or region manifest)
    pub regions: Option<PathBuf>,
    /// Region function definitions
    pub functions: Option<PathBuf>,
    /// Input G-code
    pub input: Option<PathBuf>,
    /// Output G-code
    pub output: Option<PathBuf>,
}

impl FilePaths {
    /// Resolve relative paths against `base`
    pub fn resolve_relative(&mut self, base: &Path) {
        for path in [
            &mut self.regions,
            &mut self.functions,
            &mut self.input,
            &mut self.output,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// The output path, derived from the input path when not set
    ///
    /// `part.gcode` becomes `part.vtp.gcode` next to the input.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        let input = self.input.as_ref()?;
        let stem = input.file_stem()?.to_string_lossy();
        let extension = input
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gcode".to_string());
        Some(input.with_file_name(format!("{}.vtp.{}", stem, extension)))
    }
}

/// Complete VTPKit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtpConfig {
    /// Printing parameters
    pub printing: PrintingParameters,
    /// Processing policies
    pub options: ProcessingOptions,
    /// File locations
    pub paths: FilePaths,
}

impl VtpConfig {
    /// Load config from file (JSON or TOML)
    ///
    /// Relative paths in `[paths]` are resolved against the directory
    /// containing the config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let mut config: Self = match extension_of(path).as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid TOML config: {}", e)))?,
            _ => return Err(unsupported(path).into()),
        };

        if let Some(dir) = path.parent() {
            config.paths.resolve_relative(dir);
        }

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match extension_of(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?,
            _ => return Err(unsupported(path).into()),
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.printing.validate()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn unsupported(path: &Path) -> ConfigError {
    ConfigError::UnsupportedFormat(format!(
        "{} (config file must be .json or .toml)",
        path.display()
    ))
}
