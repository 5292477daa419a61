//! Segment refiner
//!
//! Splits an infill move into evenly spaced sub-moves no longer than the
//! evaluation increment and computes Z, E and F for each from the region the
//! sub-move's midpoint falls in.

use nalgebra::Point3;
use tracing::trace;
use vtpkit_core::{ClassificationZ, EvaluationError, ExtrusionModel, Result};
use vtpkit_regions::RegionLookup;

use crate::codec::Move;

/// Upper bound on the sub-moves generated for a single move
pub const MAX_SEGMENTS: usize = 1_000_000;

/// Evenly spaced points from `start` (exclusive) to `end` (inclusive)
///
/// Every step is at most `max_length` long. A segment no longer than
/// `max_length` yields only its end point. Fails when more than
/// [`MAX_SEGMENTS`] steps would be needed.
pub fn subdivide(
    start: (f64, f64),
    end: (f64, f64),
    max_length: f64,
) -> Result<Vec<(f64, f64)>> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = dx.hypot(dy);

    let num_segments = (length / max_length).ceil();
    if num_segments > MAX_SEGMENTS as f64 {
        return Err(EvaluationError::TooManySegments {
            length,
            max_length,
            limit: MAX_SEGMENTS,
        }
        .into());
    }
    if !num_segments.is_finite() || num_segments <= 1.0 {
        return Ok(vec![end]);
    }
    let num_segments = num_segments as usize;

    let mut points = Vec::new();
    for i in 1..num_segments {
        let fraction = i as f64 / num_segments as f64;
        points.push((start.0 + dx * fraction, start.1 + dy * fraction));
    }
    points.push(end);
    Ok(points)
}

/// Refines infill moves against a region lookup
pub struct SegmentRefiner<'a, R: RegionLookup + ?Sized> {
    model: &'a ExtrusionModel,
    regions: &'a R,
    classification_z: ClassificationZ,
}

impl<'a, R: RegionLookup + ?Sized> SegmentRefiner<'a, R> {
    pub fn new(model: &'a ExtrusionModel, regions: &'a R, classification_z: ClassificationZ) -> Self {
        Self {
            model,
            regions,
            classification_z,
        }
    }

    /// Generate the sub-moves replacing the move `start -> end` at `z_current`
    ///
    /// Every returned move carries X, Y, Z, E and F. Fails on the first
    /// sub-move whose region functions produce an unusable value.
    pub fn refine(&self, start: (f64, f64), end: (f64, f64), z_current: f64) -> Result<Vec<Move>> {
        let params = self.model.params();
        let points = subdivide(start, end, params.eval_increment)?;
        let z_classify = self
            .classification_z
            .resolve(z_current, params.layer_height);

        let mut moves = Vec::with_capacity(points.len());
        let mut previous = start;

        for point in points {
            let midpoint = Point3::new(
                (previous.0 + point.0) / 2.0,
                (previous.1 + point.1) / 2.0,
                z_classify,
            );
            let region = self.regions.classify(&midpoint)?;
            let (v_star, h_star) = self.regions.evaluate(region, &midpoint)?;

            let length = (point.0 - previous.0).hypot(point.1 - previous.1);
            let out = self.model.segment(length, z_current, v_star, h_star, region)?;
            trace!(
                "Sub-move to ({:.3}, {:.3}) in region {}: z={:.3} e={:.5} f={:.1}",
                point.0,
                point.1,
                region,
                out.z,
                out.e,
                out.f
            );

            moves.push(
                Move::xy(point.0, point.1)
                    .with_z(out.z)
                    .with_e(out.e)
                    .with_f(out.f),
            );
            previous = point;
        }

        Ok(moves)
    }
}
