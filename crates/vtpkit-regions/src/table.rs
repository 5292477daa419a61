//! Regions paired with their functions, and point classification.

use nalgebra::Point3;
use std::path::Path;
use vtpkit_core::{ConfigError, EvaluationError, GeometryError, Result};

use crate::functions::{FunctionPair, FunctionTable};
use crate::manifest::load_regions;
use crate::solid::Solid;

/// Region queries consumed by the G-code transformer
pub trait RegionLookup: Send + Sync {
    /// Number of regions
    fn region_count(&self) -> usize;

    /// Region owning `point`, or the nearest one when none contains it
    fn classify(&self, point: &Point3<f64>) -> Result<usize>;

    /// `(vStar, hStar)` of `region` evaluated at `point`
    fn evaluate(&self, region: usize, point: &Point3<f64>) -> Result<(f64, f64)>;
}

/// Classify `point` against solids in registration order
///
/// The first solid containing the point wins. Otherwise the solid with the
/// smallest absolute signed distance wins, ties going to the lowest index.
pub fn classify_point<'a, S, I>(solids: I, point: &Point3<f64>) -> Result<usize>
where
    S: Solid + ?Sized + 'a,
    I: IntoIterator<Item = &'a S>,
    I::IntoIter: Clone,
{
    let solids = solids.into_iter();
    if solids.clone().next().is_none() {
        return Err(GeometryError::EmptyRegionSet.into());
    }
    if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
        return Err(EvaluationError::NonFinitePoint {
            x: point.x,
            y: point.y,
            z: point.z,
        }
        .into());
    }

    if let Some(id) = solids.clone().position(|solid| solid.contains(point)) {
        return Ok(id);
    }

    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (id, solid) in solids.enumerate() {
        let distance = solid.signed_distance(point).abs();
        // strict comparison keeps the lowest id on ties
        if distance < best_distance {
            best = id;
            best_distance = distance;
        }
    }
    Ok(best)
}

/// One region: a solid and its function pair
#[derive(Debug)]
pub struct Region {
    pub solid: Box<dyn Solid>,
    pub functions: FunctionPair,
}

/// All regions of a run, keyed by dense zero-based id
#[derive(Debug)]
pub struct RegionTable {
    regions: Vec<Region>,
}

impl RegionTable {
    /// Zip solids with function pairs
    ///
    /// The counts must match; an empty solid list is a geometry error.
    pub fn new(solids: Vec<Box<dyn Solid>>, functions: FunctionTable) -> Result<Self> {
        if solids.is_empty() {
            return Err(GeometryError::EmptyRegionSet.into());
        }
        if solids.len() != functions.len() {
            return Err(ConfigError::RegionCountMismatch {
                regions: solids.len(),
                functions: functions.len(),
            }
            .into());
        }

        let regions = solids
            .into_iter()
            .zip(functions.into_pairs())
            .map(|(solid, functions)| Region { solid, functions })
            .collect();
        Ok(Self { regions })
    }

    /// Load the region source and the function file, then zip them
    pub fn load(regions_path: &Path, functions_path: &Path) -> Result<Self> {
        let solids = load_regions(regions_path)?;
        let functions = FunctionTable::load(functions_path)?;
        Self::new(solids, functions)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, region: usize) -> Option<&Region> {
        self.regions.get(region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> + Clone {
        self.regions.iter()
    }
}

impl RegionLookup for RegionTable {
    fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn classify(&self, point: &Point3<f64>) -> Result<usize> {
        classify_point(self.regions.iter().map(|r| r.solid.as_ref()), point)
    }

    fn evaluate(&self, region: usize, point: &Point3<f64>) -> Result<(f64, f64)> {
        let entry = self.get(region).ok_or(EvaluationError::RegionOutOfRange {
            region,
            count: self.len(),
        })?;
        Ok(entry.functions.evaluate(point.x, point.y, point.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid::{BoxSolid, SphereSolid};
    use vtpkit_core::Error;

    fn boxed(min: [f64; 3], max: [f64; 3]) -> Box<dyn Solid> {
        Box::new(BoxSolid::new(Point3::from(min), Point3::from(max)).unwrap())
    }

    #[test]
    fn test_count_mismatch() {
        let functions = FunctionTable::parse("1 ; 1\n2 ; 2\n", "inline").unwrap();
        let err = RegionTable::new(vec![boxed([0.0; 3], [1.0; 3])], functions).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RegionCountMismatch {
                regions: 1,
                functions: 2
            })
        ));
    }

    #[test]
    fn test_empty_solids() {
        let functions = FunctionTable::parse("1 ; 1\n", "inline").unwrap();
        let err = RegionTable::new(Vec::new(), functions).unwrap_err();
        assert!(err.is_geometry_error());
        assert!(classify_point(std::iter::empty::<&dyn Solid>(), &Point3::origin()).is_err());
    }

    #[test]
    fn test_table_classify_matches_classify_point() {
        let functions = FunctionTable::parse("1 ; 1\n2 ; 2\n3 ; 3\n", "inline").unwrap();
        let solids = vec![
            boxed([0.0; 3], [10.0; 3]),
            boxed([5.0; 3], [15.0; 3]),
            Box::new(SphereSolid::new(Point3::new(30.0, 0.0, 0.0), 2.0).unwrap()) as Box<dyn Solid>,
        ];
        let table = RegionTable::new(solids, functions).unwrap();

        let points = [
            Point3::new(7.0, 7.0, 7.0),
            Point3::new(12.0, 12.0, 12.0),
            Point3::new(30.0, 0.5, 0.0),
            Point3::new(24.0, 0.0, 0.0),
            Point3::new(-3.0, -3.0, -3.0),
        ];
        for p in &points {
            let direct = classify_point(table.iter().map(|r| r.solid.as_ref()), p).unwrap();
            assert_eq!(table.classify(p).unwrap(), direct);
        }
        assert_eq!(table.classify(&points[0]).unwrap(), 0);
        assert_eq!(table.classify(&points[1]).unwrap(), 1);
        assert_eq!(table.classify(&points[2]).unwrap(), 2);
    }

    #[test]
    fn test_non_finite_point() {
        let functions = FunctionTable::parse("1 ; 1\n", "inline").unwrap();
        let table = RegionTable::new(vec![boxed([0.0; 3], [1.0; 3])], functions).unwrap();
        let err = table
            .classify(&Point3::new(f64::NAN, 0.0, 0.0))
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_evaluate_uses_region_pair() {
        let functions = FunctionTable::parse("1 ; x\n2 ; y\n", "inline").unwrap();
        let table = RegionTable::new(
            vec![
                boxed([0.0; 3], [1.0; 3]),
                Box::new(SphereSolid::new(Point3::new(5.0, 5.0, 5.0), 1.0).unwrap()),
            ],
            functions,
        )
        .unwrap();

        let p = Point3::new(5.0, 5.5, 5.0);
        let id = table.classify(&p).unwrap();
        assert_eq!(id, 1);
        assert_eq!(table.evaluate(id, &p).unwrap(), (2.0, 5.5));
        assert!(table.evaluate(2, &p).is_err());
    }
}
