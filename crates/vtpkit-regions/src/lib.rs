//! # VTPKit Regions
//!
//! The spatial side of variable thickness printing: solids that partition the
//! printed object, loaded from STL meshes or a manifest, and the per-region
//! speed/height functions evaluated at a point.

pub mod expr;
pub mod functions;
pub mod manifest;
pub mod mesh;
pub mod solid;
pub mod table;

pub use expr::{Expr, ExprError};
pub use functions::{FunctionPair, FunctionTable};
pub use manifest::{load_regions, RegionManifest, RegionSpec};
pub use mesh::MeshSolid;
pub use solid::{BoxSolid, Solid, SphereSolid};
pub use table::{classify_point, Region, RegionLookup, RegionTable};
