//! Stream transformer
//!
//! Walks a whole G-code program once, tagging every line and rewriting the
//! ones whose tag calls for it:
//! - Infill moves are refined into sub-moves with region dependent Z/E/F
//! - Travel moves carrying Z collapse into one Z move toward the next infill
//! - Support moves are pinned to the current layer Z
//! - Bare Z moves are dropped, nozzle checks optionally so
//!
//! All other lines pass through byte for byte.

use nalgebra::Point3;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use vtpkit_core::{
    Error, ErrorPolicy, ExtrusionModel, ParseError, ProcessingOptions, Result,
};
use vtpkit_regions::RegionLookup;

use crate::codec::{self, Move};
use crate::refiner::SegmentRefiner;
use crate::tags::LineTag;

const SUPPORT_ANNOTATION: &str = "vtp support";
const TRAVEL_Z_ANNOTATION: &str = "vtp travel z";
const INFILL_ANNOTATION: &str = "vtp infill";

/// Cursor carried from line to line within one pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformerState {
    pub previous_x: f64,
    pub previous_y: f64,
    pub current_z: f64,
}

/// A per-line failure that was skipped over
#[derive(Debug)]
pub struct LineIssue {
    /// 1-based input line number
    pub line_number: usize,
    pub error: Error,
}

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub input_lines: usize,
    pub output_lines: usize,
    /// Infill lines replaced by refined sub-moves
    pub infill_lines_expanded: usize,
    /// Sub-moves emitted for those infill lines
    pub generated_moves: usize,
    /// Travel lines collapsed into a single Z move
    pub travel_moves_collapsed: usize,
    pub nozzle_checks_dropped: usize,
    pub bare_z_moves_dropped: usize,
}

/// Output of a pass
#[derive(Debug, Default)]
pub struct TransformReport {
    /// Output lines, each with its terminator
    pub lines: Vec<String>,
    pub stats: TransformStats,
    /// Recovered per-line failures, in input order
    pub issues: Vec<LineIssue>,
}

impl TransformReport {
    /// Whether any line was passed through because it failed
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

enum Outcome {
    Keep,
    Drop,
    Replace(Vec<String>),
}

/// Rewrites a G-code program for variable thickness printing
pub struct Transformer<'a, R: RegionLookup + ?Sized> {
    model: &'a ExtrusionModel,
    regions: &'a R,
    options: ProcessingOptions,
}

impl<'a, R: RegionLookup + ?Sized> Transformer<'a, R> {
    pub fn new(model: &'a ExtrusionModel, regions: &'a R, options: ProcessingOptions) -> Self {
        Self {
            model,
            regions,
            options,
        }
    }

    /// Transform a program given as lines with their terminators
    ///
    /// In best-effort mode a line that fails to parse or evaluate is emitted
    /// unchanged and recorded in the report; in strict mode the first such
    /// failure aborts the pass. Other errors always abort.
    pub fn transform<S: AsRef<str>>(&self, lines: &[S]) -> Result<TransformReport> {
        let tags: Vec<LineTag> = lines.iter().map(|l| LineTag::classify(l.as_ref())).collect();
        let infill_index: Vec<usize> = tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| **tag == LineTag::Infill)
            .map(|(i, _)| i)
            .collect();

        let refiner = SegmentRefiner::new(self.model, self.regions, self.options.classification_z);
        let mut state = TransformerState::default();
        let mut report = TransformReport::default();
        report.stats.input_lines = lines.len();

        for (index, (line, tag)) in lines.iter().zip(&tags).enumerate() {
            let line = line.as_ref();
            let line_number = index + 1;

            let outcome = self.process_line(
                line,
                line_number,
                *tag,
                lines,
                &infill_index,
                &refiner,
                &mut state,
                &mut report.stats,
            );

            match outcome {
                Ok(Outcome::Keep) => report.lines.push(line.to_string()),
                Ok(Outcome::Drop) => {}
                Ok(Outcome::Replace(generated)) => report.lines.extend(generated),
                Err(e) if e.is_recoverable() && self.options.error_policy == ErrorPolicy::BestEffort => {
                    warn!("Line {} ({}): {}; passing through unchanged", line_number, tag, e);
                    report.lines.push(line.to_string());
                    report.issues.push(LineIssue {
                        line_number,
                        error: e,
                    });
                }
                Err(e) => return Err(e.at_line(line_number)),
            }
        }

        report.stats.output_lines = report.lines.len();
        info!(
            "Transformed {} lines into {} ({} infill lines -> {} moves, {} travel Z moves, {} issues)",
            report.stats.input_lines,
            report.stats.output_lines,
            report.stats.infill_lines_expanded,
            report.stats.generated_moves,
            report.stats.travel_moves_collapsed,
            report.issues.len()
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_line<S: AsRef<str>>(
        &self,
        line: &str,
        line_number: usize,
        tag: LineTag,
        lines: &[S],
        infill_index: &[usize],
        refiner: &SegmentRefiner<'_, R>,
        state: &mut TransformerState,
        stats: &mut TransformStats,
    ) -> Result<Outcome> {
        match tag {
            LineTag::NozzleCheck => {
                if self.options.remove_nozzle_check {
                    debug!("Line {}: dropping nozzle check", line_number);
                    stats.nozzle_checks_dropped += 1;
                    Ok(Outcome::Drop)
                } else {
                    Ok(Outcome::Keep)
                }
            }
            LineTag::Support => {
                let parsed = codec::parse(line)?;
                let pinned = Move {
                    z: Some(state.current_z),
                    ..parsed
                };
                Ok(Outcome::Replace(vec![codec::format(&pinned, SUPPORT_ANNOTATION)]))
            }
            LineTag::ZMarker => {
                state.current_z = parse_z_marker(line)?;
                debug!("Line {}: layer Z = {}", line_number, state.current_z);
                Ok(Outcome::Keep)
            }
            LineTag::TravelWithZ => {
                // first infill line after this one
                let next = infill_index.partition_point(|&i| i < line_number);
                let Some(&target_index) = infill_index.get(next) else {
                    debug!("Line {}: no later infill, travel kept", line_number);
                    return Ok(Outcome::Keep);
                };

                let target = codec::parse(lines[target_index].as_ref())?;
                let target_line = target_index + 1;
                let x = target.x.ok_or(ParseError::MissingAxis {
                    line_number: target_line,
                    axis: 'X',
                })?;
                let y = target.y.ok_or(ParseError::MissingAxis {
                    line_number: target_line,
                    axis: 'Y',
                })?;

                let point = Point3::new(x, y, state.current_z);
                let region = self.regions.classify(&point)?;
                let (_, h_star) = self.regions.evaluate(region, &point)?;
                let z = self.model.travel_z(state.current_z, h_star, region)?;
                debug!(
                    "Line {}: travel Z -> {:.3} toward line {} (region {})",
                    line_number, z, target_line, region
                );

                stats.travel_moves_collapsed += 1;
                let mv = Move::default()
                    .with_z(z)
                    .with_f(self.model.params().travel_speed);
                Ok(Outcome::Replace(vec![codec::format(&mv, TRAVEL_Z_ANNOTATION)]))
            }
            LineTag::Travel => {
                let parsed = codec::parse(line)?;
                if let Some(x) = parsed.x {
                    state.previous_x = x;
                }
                if let Some(y) = parsed.y {
                    state.previous_y = y;
                }
                Ok(Outcome::Keep)
            }
            LineTag::Infill => {
                let parsed = codec::parse(line)?;
                if parsed.x.is_none() && parsed.y.is_none() {
                    return Ok(Outcome::Keep);
                }

                let start = (state.previous_x, state.previous_y);
                let end = (
                    parsed.x.unwrap_or(state.previous_x),
                    parsed.y.unwrap_or(state.previous_y),
                );
                let moves = refiner.refine(start, end, state.current_z)?;
                debug!(
                    "Line {}: infill ({:.3}, {:.3}) -> ({:.3}, {:.3}) in {} moves",
                    line_number,
                    start.0,
                    start.1,
                    end.0,
                    end.1,
                    moves.len()
                );

                state.previous_x = end.0;
                state.previous_y = end.1;
                stats.infill_lines_expanded += 1;
                stats.generated_moves += moves.len();

                Ok(Outcome::Replace(
                    moves
                        .iter()
                        .map(|mv| codec::format(mv, INFILL_ANNOTATION))
                        .collect(),
                ))
            }
            LineTag::BareZMove => {
                warn!(
                    "Line {}: dropping unexpected Z move: {}",
                    line_number,
                    line.trim_end()
                );
                stats.bare_z_moves_dropped += 1;
                Ok(Outcome::Drop)
            }
            LineTag::Default => Ok(Outcome::Keep),
        }
    }
}

/// Value of a `;Z:<number>` marker
pub fn parse_z_marker(line: &str) -> Result<f64> {
    static Z_MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = Z_MARKER_REGEX.get_or_init(|| {
        Regex::new(r";Z:\s*([+-]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    });

    regex
        .captures(line)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .ok_or_else(|| {
            ParseError::MalformedZMarker {
                text: line.trim_end().to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_z_marker() {
        assert_eq!(parse_z_marker(";Z:0.4\n").unwrap(), 0.4);
        assert_eq!(parse_z_marker(";Z:12\n").unwrap(), 12.0);
        let err = parse_z_marker(";Z:abc\n").unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_report_degraded() {
        let mut report = TransformReport::default();
        assert!(!report.is_degraded());
        report.issues.push(LineIssue {
            line_number: 3,
            error: ParseError::EmptyLine.into(),
        });
        assert!(report.is_degraded());
    }
}
