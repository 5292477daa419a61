//! Region sources: a bare STL file or a TOML/JSON manifest of solids.
//!
//! ```toml
//! [[regions]]
//! type = "box"
//! min = [0.0, 0.0, 0.0]
//! max = [20.0, 20.0, 5.0]
//!
//! [[regions]]
//! type = "sphere"
//! center = [10.0, 10.0, 10.0]
//! radius = 4.0
//!
//! [[regions]]
//! type = "stl"
//! path = "insert.stl"
//! ```

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vtpkit_core::{ConfigError, GeometryError, Result};

use crate::mesh::MeshSolid;
use crate::solid::{BoxSolid, Solid, SphereSolid};

/// One entry of a region manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegionSpec {
    /// Axis-aligned box
    Box { min: [f64; 3], max: [f64; 3] },
    /// Sphere
    Sphere { center: [f64; 3], radius: f64 },
    /// Every body of an STL file, in file order
    Stl { path: PathBuf },
}

/// Ordered list of region solids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionManifest {
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
}

impl RegionManifest {
    /// Read a manifest (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = match extension_of(path).as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid JSON region manifest: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid TOML region manifest: {}", e)))?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(format!(
                    "{} (region manifest must be .json or .toml)",
                    path.display()
                ))
                .into())
            }
        };
        Ok(manifest)
    }

    /// Build the solids, resolving relative STL paths against `base_dir`
    pub fn build(&self, base_dir: &Path) -> Result<Vec<Box<dyn Solid>>> {
        let mut solids: Vec<Box<dyn Solid>> = Vec::new();

        for spec in &self.regions {
            match spec {
                RegionSpec::Box { min, max } => {
                    solids.push(Box::new(BoxSolid::new(
                        Point3::from(*min),
                        Point3::from(*max),
                    )?));
                }
                RegionSpec::Sphere { center, radius } => {
                    solids.push(Box::new(SphereSolid::new(Point3::from(*center), *radius)?));
                }
                RegionSpec::Stl { path } => {
                    let resolved = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path.clone()
                    };
                    for body in MeshSolid::load_stl(&resolved)? {
                        solids.push(Box::new(body));
                    }
                }
            }
        }

        Ok(solids)
    }
}

/// Load region solids from an STL file or a region manifest
///
/// Fails with a geometry error when the source yields no solids.
pub fn load_regions(path: &Path) -> Result<Vec<Box<dyn Solid>>> {
    let solids: Vec<Box<dyn Solid>> = match extension_of(path).as_deref() {
        Some("stl") => MeshSolid::load_stl(path)?
            .into_iter()
            .map(|body| Box::new(body) as Box<dyn Solid>)
            .collect(),
        Some("toml") | Some("json") => {
            let manifest = RegionManifest::load_from_file(path)?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            manifest.build(base_dir)?
        }
        _ => {
            return Err(GeometryError::Load {
                path: path.display().to_string(),
                reason: "expected an .stl file or a .toml/.json region manifest".to_string(),
            }
            .into())
        }
    };

    if solids.is_empty() {
        return Err(GeometryError::EmptyRegionSet.into());
    }

    for (id, solid) in solids.iter().enumerate() {
        debug!("Region {}: {}", id, solid.describe());
    }
    info!("Loaded {} region(s) from {}", solids.len(), path.display());
    Ok(solids)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}
