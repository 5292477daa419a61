//! Triangle mesh solids loaded from STL files.
//!
//! An STL export frequently carries several disjoint bodies in one file. They
//! are separated into one [`MeshSolid`] per connected body, ordered by the
//! lowest face index of each body so the file order is preserved.

use nalgebra::{Point3, Vector3};
use std::path::Path;
use tracing::debug;
use vtpkit_core::{GeometryError, Result};

use crate::solid::Solid;

/// Ray direction for parity tests. Slightly oblique so rays cast from
/// axis-aligned points do not run along shared triangle edges.
const RAY_DIRECTION: [f64; 3] = [1.0, 0.000_173_205_08, 0.000_141_421_36];

const EPSILON: f64 = 1e-10;

/// A closed triangle mesh
#[derive(Debug, Clone)]
pub struct MeshSolid {
    triangles: Vec<[Point3<f64>; 3]>,
    bounds_min: Point3<f64>,
    bounds_max: Point3<f64>,
}

impl MeshSolid {
    /// Build a solid from raw triangles
    pub fn new(triangles: Vec<[Point3<f64>; 3]>) -> Result<Self> {
        let first = triangles
            .first()
            .ok_or_else(|| GeometryError::EmptyMesh("no triangles".to_string()))?;

        let mut bounds_min = first[0];
        let mut bounds_max = first[0];
        for vertex in triangles.iter().flatten() {
            bounds_min = bounds_min.inf(vertex);
            bounds_max = bounds_max.sup(vertex);
        }

        Ok(Self {
            triangles,
            bounds_min,
            bounds_max,
        })
    }

    /// Split an indexed STL mesh into one solid per connected body
    pub fn bodies_from_stl(stl_mesh: &stl_io::IndexedMesh) -> Result<Vec<Self>> {
        let vertex_count = stl_mesh.vertices.len();
        let mut sets = DisjointSet::new(vertex_count);

        for face in &stl_mesh.faces {
            let [a, b, c] = face.vertices;
            if a >= vertex_count || b >= vertex_count || c >= vertex_count {
                return Err(GeometryError::InvalidSolid(format!(
                    "face references vertex outside 0..{}",
                    vertex_count
                ))
                .into());
            }
            sets.union(a, b);
            sets.union(a, c);
        }

        // Body order follows the first face of each body
        let mut body_of_root: Vec<Option<usize>> = vec![None; vertex_count];
        let mut bodies: Vec<Vec<[Point3<f64>; 3]>> = Vec::new();

        for face in &stl_mesh.faces {
            let root = sets.find(face.vertices[0]);
            let body = *body_of_root[root].get_or_insert_with(|| {
                bodies.push(Vec::new());
                bodies.len() - 1
            });

            let corners = face.vertices.map(|index| {
                let v = stl_mesh.vertices[index];
                Point3::new(v[0] as f64, v[1] as f64, v[2] as f64)
            });
            bodies[body].push(corners);
        }

        bodies.into_iter().map(Self::new).collect()
    }

    /// Load every body of an STL file
    pub fn load_stl(path: &Path) -> Result<Vec<Self>> {
        debug!("Loading STL regions from {}", path.display());

        let load_error = |reason: String| GeometryError::Load {
            path: path.display().to_string(),
            reason,
        };

        let mut file = std::fs::File::open(path).map_err(|e| load_error(e.to_string()))?;
        let stl = stl_io::read_stl(&mut file).map_err(|e| load_error(e.to_string()))?;

        if stl.faces.is_empty() {
            return Err(GeometryError::EmptyMesh(path.display().to_string()).into());
        }

        let bodies = Self::bodies_from_stl(&stl)?;
        debug!(
            "STL {} contains {} faces in {} bodies",
            path.display(),
            stl.faces.len(),
            bodies.len()
        );
        Ok(bodies)
    }

    fn inside_bounds(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.bounds_min[i] && point[i] <= self.bounds_max[i])
    }

    fn unsigned_distance(&self, point: &Point3<f64>) -> f64 {
        self.triangles
            .iter()
            .map(|[a, b, c]| nalgebra::distance(point, &closest_point_on_triangle(point, a, b, c)))
            .fold(f64::INFINITY, f64::min)
    }
}

impl Solid for MeshSolid {
    fn contains(&self, point: &Point3<f64>) -> bool {
        if !self.inside_bounds(point) {
            return false;
        }

        let direction = Vector3::from(RAY_DIRECTION).normalize();
        let crossings = self
            .triangles
            .iter()
            .filter(|[a, b, c]| ray_triangle_intersect(point, &direction, a, b, c).is_some())
            .count();
        crossings % 2 == 1
    }

    fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        let distance = self.unsigned_distance(point);
        if self.contains(point) {
            -distance
        } else {
            distance
        }
    }

    fn describe(&self) -> String {
        format!(
            "mesh ({} triangles) [{:.3}, {:.3}, {:.3}]..[{:.3}, {:.3}, {:.3}]",
            self.triangles.len(),
            self.bounds_min.x,
            self.bounds_min.y,
            self.bounds_min.z,
            self.bounds_max.x,
            self.bounds_max.y,
            self.bounds_max.z
        )
    }
}

/// Closest point on triangle `abc` to `p` (Ericson, Real-Time Collision Detection 5.1.5)
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Möller–Trumbore ray/triangle test, returning the ray parameter of the hit
pub fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;

    let h = direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < EPSILON {
        return None;
    }

    let inv = 1.0 / det;
    let s = origin - a;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv * edge2.dot(&q);
    (t > EPSILON).then_some(t)
}

/// Union-find over vertex indices
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            // keep the lower index as root
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}

/// Triangles of an axis-aligned box, outward facing
pub fn box_triangles(min: Point3<f64>, max: Point3<f64>) -> Vec<[Point3<f64>; 3]> {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    const FACES: [[usize; 4]; 6] = [
        [0, 2, 3, 1], // -Z
        [4, 5, 7, 6], // +Z
        [0, 1, 5, 4], // -Y
        [2, 6, 7, 3], // +Y
        [0, 4, 6, 2], // -X
        [1, 3, 7, 5], // +X
    ];

    FACES
        .iter()
        .flat_map(|[a, b, c, d]| {
            [
                [corner(*a), corner(*b), corner(*c)],
                [corner(*a), corner(*c), corner(*d)],
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> MeshSolid {
        MeshSolid::new(box_triangles(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 10.0),
        ))
        .unwrap()
    }

    #[test]
    fn test_closest_point_regions() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let c = Point3::new(0.0, 10.0, 0.0);

        let face = closest_point_on_triangle(&Point3::new(2.0, 2.0, 5.0), &a, &b, &c);
        assert!((face - Point3::new(2.0, 2.0, 0.0)).norm() < 1e-12);

        let vertex = closest_point_on_triangle(&Point3::new(-3.0, -3.0, 0.0), &a, &b, &c);
        assert_eq!(vertex, a);

        let edge = closest_point_on_triangle(&Point3::new(5.0, -4.0, 0.0), &a, &b, &c);
        assert!((edge - Point3::new(5.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_ray_hits_triangle() {
        let hit = ray_triangle_intersect(
            &Point3::new(-5.0, 1.0, 1.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 10.0, 0.0),
            &Point3::new(0.0, 0.0, 10.0),
        );
        assert!((hit.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_mesh_contains_center_on_diagonal() {
        let mesh = cube();
        // (5, 5, 5) lies on the triangulation diagonals of the +X face
        assert!(mesh.contains(&Point3::new(5.0, 5.0, 5.0)));
        assert!(mesh.contains(&Point3::new(1.0, 9.0, 2.0)));
        assert!(!mesh.contains(&Point3::new(-1.0, 5.0, 5.0)));
        assert!(!mesh.contains(&Point3::new(15.0, 5.0, 5.0)));
    }

    #[test]
    fn test_mesh_signed_distance() {
        let mesh = cube();
        assert!((mesh.signed_distance(&Point3::new(5.0, 5.0, 5.0)) + 5.0).abs() < 1e-9);
        assert!((mesh.signed_distance(&Point3::new(12.0, 5.0, 5.0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = MeshSolid::new(Vec::new()).unwrap_err();
        assert!(err.is_geometry_error());
    }

    #[test]
    fn test_disjoint_set() {
        let mut sets = DisjointSet::new(5);
        sets.union(3, 4);
        sets.union(1, 3);
        assert_eq!(sets.find(4), 1);
        assert_ne!(sets.find(0), sets.find(4));
    }
}
