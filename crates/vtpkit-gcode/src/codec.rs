//! Motion command codec
//!
//! Parses the axis words of a `G0`/`G1` line into a [`Move`] and formats a
//! [`Move`] back into canonical text with three decimals per field.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;
use vtpkit_core::{ParseError, Result};

/// Axis values of a motion command; absent words stay `None`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Move {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub f: Option<f64>,
}

impl Move {
    /// A move to a planar point
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_e(mut self, e: f64) -> Self {
        self.e = Some(e);
        self
    }

    pub fn with_f(mut self, f: f64) -> Self {
        self.f = Some(f);
        self
    }

    /// Fields in output order
    fn fields(&self) -> [(char, Option<f64>); 5] {
        [
            ('X', self.x),
            ('Y', self.y),
            ('Z', self.z),
            ('E', self.e),
            ('F', self.f),
        ]
    }

    fn slot(&mut self, axis: char) -> Option<&mut Option<f64>> {
        match axis {
            'X' => Some(&mut self.x),
            'Y' => Some(&mut self.y),
            'Z' => Some(&mut self.z),
            'E' => Some(&mut self.e),
            'F' => Some(&mut self.f),
            _ => None,
        }
    }
}

/// Split a line at its first `;` into command and annotation
///
/// Line terminators are stripped; the annotation is trimmed.
pub fn split_annotation(line: &str) -> (&str, Option<&str>) {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.split_once(';') {
        Some((command, annotation)) => (command, Some(annotation.trim())),
        None => (line, None),
    }
}

fn axis_regex() -> &'static Regex {
    static AXIS_REGEX: OnceLock<Regex> = OnceLock::new();
    AXIS_REGEX.get_or_init(|| Regex::new(r"([XYZEF])([^\sXYZEF]*)").expect("invalid regex pattern"))
}

fn number_regex() -> &'static Regex {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    NUMBER_REGEX
        .get_or_init(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("invalid regex pattern"))
}

/// Whether the command part of `line` carries an axis word
pub fn has_axis(line: &str, axis: char) -> bool {
    let (command, _) = split_annotation(line);
    axis_regex()
        .captures_iter(command)
        .any(|caps| caps[1].starts_with(axis))
}

/// Parse the axis words of a line
///
/// Only the command part before the first `;` is scanned. The first
/// occurrence of each axis wins. An axis letter followed directly by
/// non-numeric text is a malformed coordinate.
pub fn parse(line: &str) -> Result<Move> {
    if line.trim().is_empty() {
        return Err(ParseError::EmptyLine.into());
    }

    let (command, _) = split_annotation(line);
    let mut parsed = Move::default();

    for caps in axis_regex().captures_iter(command) {
        let axis = caps[1].chars().next().unwrap_or('X');
        let text = &caps[2];
        // a bare letter carries no value
        if text.is_empty() {
            continue;
        }

        let Some(slot) = parsed.slot(axis) else {
            continue;
        };
        if slot.is_some() {
            continue;
        }

        if !number_regex().is_match(text) {
            return Err(ParseError::MalformedCoordinate {
                axis,
                text: text.to_string(),
            }
            .into());
        }
        let value = text.parse::<f64>().map_err(|_| ParseError::MalformedCoordinate {
            axis,
            text: text.to_string(),
        })?;
        *slot = Some(value);
    }

    Ok(parsed)
}

/// Format a move as `G1 X.. Y.. Z.. E.. F.. ; annotation\n`
///
/// Only present fields are written. An empty annotation writes no comment.
pub fn format(mv: &Move, annotation: &str) -> String {
    let mut line = String::from("G1");
    for (axis, value) in mv.fields() {
        if let Some(value) = value {
            let _ = write!(line, " {}{:.3}", axis, value);
        }
    }
    if !annotation.is_empty() {
        let _ = write!(line, " ; {}", annotation);
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtpkit_core::Error;

    #[test]
    fn test_parse_full_move() {
        let mv = parse("G1 X100.5 Y200.3 Z1.2 E-0.5 F1800 ; infill\n").unwrap();
        assert_eq!(mv.x, Some(100.5));
        assert_eq!(mv.y, Some(200.3));
        assert_eq!(mv.z, Some(1.2));
        assert_eq!(mv.e, Some(-0.5));
        assert_eq!(mv.f, Some(1800.0));
    }

    #[test]
    fn test_parse_partial_and_compact() {
        let mv = parse("G1 X10Y-2.5").unwrap();
        assert_eq!(mv, Move::xy(10.0, -2.5));

        let mv = parse("G0 F7200").unwrap();
        assert_eq!(mv.x, None);
        assert_eq!(mv.f, Some(7200.0));

        assert_eq!(parse("G1 X.5").unwrap().x, Some(0.5));
    }

    #[test]
    fn test_comment_text_is_ignored() {
        let mv = parse("G1 X5 ;Z:0.4 TYPE:External perimeter").unwrap();
        assert_eq!(mv.x, Some(5.0));
        assert_eq!(mv.z, None);
        assert_eq!(mv.f, None);

        assert_eq!(parse(";Z:0.6\n").unwrap(), Move::default());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mv = parse("G1 X1 X2").unwrap();
        assert_eq!(mv.x, Some(1.0));
    }

    #[test]
    fn test_malformed_coordinate() {
        let err = parse("G1 Xinvalid").unwrap_err();
        assert!(err.to_string().contains("Invalid X coordinate"));
        assert!(matches!(
            err,
            Error::Parse(ParseError::MalformedCoordinate { axis: 'X', .. })
        ));

        assert!(parse("G1 X1 Y2.3.4").is_err());
    }

    #[test]
    fn test_empty_line() {
        assert!(matches!(
            parse("   \n").unwrap_err(),
            Error::Parse(ParseError::EmptyLine)
        ));
        assert!(parse("").is_err());
    }

    #[test]
    fn test_format() {
        let mv = Move::xy(100.5, 200.3);
        assert_eq!(format(&mv, "comment"), "G1 X100.500 Y200.300 ; comment\n");

        let mv = Move::default().with_z(0.25).with_f(15000.0);
        assert_eq!(format(&mv, ""), "G1 Z0.250 F15000.000\n");
    }

    #[test]
    fn test_split_annotation() {
        assert_eq!(
            split_annotation("G1 X1 ; travel\r\n"),
            ("G1 X1 ", Some("travel"))
        );
        assert_eq!(split_annotation("M104 S200\n"), ("M104 S200", None));
    }

    #[test]
    fn test_has_axis() {
        assert!(has_axis("G1 Z0.6 F9000 ; move", 'Z'));
        assert!(!has_axis("G1 X1 Y1 ; move to Z", 'Z'));
    }
}
