//! Solid regions answering containment and distance queries.

use nalgebra::{Point3, Vector3};
use vtpkit_core::{GeometryError, Result};

/// A closed solid that can be queried for containment and surface distance
pub trait Solid: std::fmt::Debug + Send + Sync {
    /// Whether the point lies inside the solid or on its boundary
    fn contains(&self, point: &Point3<f64>) -> bool;

    /// Signed distance to the surface, negative inside
    fn signed_distance(&self, point: &Point3<f64>) -> f64;

    /// Short human readable description for logs
    fn describe(&self) -> String;
}

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSolid {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoxSolid {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Result<Self> {
        let ordered = (0..3).all(|i| min[i] <= max[i]);
        let finite = (0..3).all(|i| min[i].is_finite() && max[i].is_finite());
        if !ordered || !finite {
            return Err(GeometryError::InvalidSolid(format!(
                "box min {:?} must not exceed max {:?}",
                min.coords.as_slice(),
                max.coords.as_slice()
            ))
            .into());
        }
        Ok(Self { min, max })
    }
}

impl Solid for BoxSolid {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        let center = nalgebra::center(&self.min, &self.max);
        let half = (self.max - self.min) * 0.5;
        let q: Vector3<f64> = (*point - center).abs() - half;

        let outside = q.map(|c| c.max(0.0)).norm();
        let inside = q.max().min(0.0);
        outside + inside
    }

    fn describe(&self) -> String {
        format!(
            "box [{:.3}, {:.3}, {:.3}]..[{:.3}, {:.3}, {:.3}]",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// Sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSolid {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl SphereSolid {
    pub fn new(center: Point3<f64>, radius: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(GeometryError::InvalidSolid(format!(
                "sphere radius must be positive, got {}",
                radius
            ))
            .into());
        }
        Ok(Self { center, radius })
    }
}

impl Solid for SphereSolid {
    fn contains(&self, point: &Point3<f64>) -> bool {
        nalgebra::distance(point, &self.center) <= self.radius
    }

    fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        nalgebra::distance(point, &self.center) - self.radius
    }

    fn describe(&self) -> String {
        format!(
            "sphere ({:.3}, {:.3}, {:.3}) r={:.3}",
            self.center.x, self.center.y, self.center.z, self.radius
        )
    }
}
