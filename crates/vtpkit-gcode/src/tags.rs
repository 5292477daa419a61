//! Line tags recognized by the transformer.

use crate::codec::{has_axis, split_annotation};

pub const NOZZLE_CHECK_MARKER: &str = "; nozzle check";
pub const SUPPORT_MARKER: &str = "; support";
pub const Z_MARKER: &str = ";Z:";
pub const TRAVEL_MARKER: &str = "; travel";
pub const MOVE_MARKER: &str = "; move";
pub const INFILL_MARKER: &str = "; infill";

/// What the transformer does with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    NozzleCheck,
    Support,
    ZMarker,
    TravelWithZ,
    Travel,
    Infill,
    BareZMove,
    Default,
}

impl LineTag {
    /// Tag a line; the first matching rule wins
    pub fn classify(line: &str) -> Self {
        if line.contains(NOZZLE_CHECK_MARKER) {
            return Self::NozzleCheck;
        }
        if line.contains(SUPPORT_MARKER) {
            return Self::Support;
        }
        if line.contains(Z_MARKER) {
            return Self::ZMarker;
        }
        if line.contains(TRAVEL_MARKER) || line.contains(MOVE_MARKER) {
            return if has_axis(line, 'Z') {
                Self::TravelWithZ
            } else {
                Self::Travel
            };
        }
        if line.contains(INFILL_MARKER) {
            return Self::Infill;
        }
        if is_linear_move(line) && has_axis(line, 'Z') {
            return Self::BareZMove;
        }
        Self::Default
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NozzleCheck => "nozzle-check",
            Self::Support => "support",
            Self::ZMarker => "z-marker",
            Self::TravelWithZ => "travel-with-z",
            Self::Travel => "travel",
            Self::Infill => "infill",
            Self::BareZMove => "bare-z-move",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for LineTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `G0`/`G1` (also `G00`/`G01`) as the first word
fn is_linear_move(line: &str) -> bool {
    let (command, _) = split_annotation(line);
    matches!(
        command.split_whitespace().next(),
        Some("G0" | "G1" | "G00" | "G01")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(
            LineTag::classify("G1 X1 Y1 ; nozzle check ; support"),
            LineTag::NozzleCheck
        );
        assert_eq!(LineTag::classify("G1 X1 Y1 E0.1 ; support"), LineTag::Support);
        assert_eq!(LineTag::classify(";Z:0.4\n"), LineTag::ZMarker);
        assert_eq!(
            LineTag::classify("G1 Z0.6 F9000 ; travel"),
            LineTag::TravelWithZ
        );
        assert_eq!(
            LineTag::classify("G1 X5 Y5 Z0.6 ; move to next layer"),
            LineTag::TravelWithZ
        );
        assert_eq!(LineTag::classify("G1 X5 Y5 F9000 ; travel"), LineTag::Travel);
        assert_eq!(LineTag::classify("G1 X5 Y5 E1 ; infill"), LineTag::Infill);
        assert_eq!(LineTag::classify("G1 Z2.0 F600"), LineTag::BareZMove);
        assert_eq!(LineTag::classify("G0 Z2.0"), LineTag::BareZMove);
    }

    #[test]
    fn test_default_lines() {
        assert_eq!(LineTag::classify("M104 S200\n"), LineTag::Default);
        assert_eq!(LineTag::classify("; layer_height = 0.2\n"), LineTag::Default);
        assert_eq!(LineTag::classify("\n"), LineTag::Default);
        assert_eq!(LineTag::classify("G28 ; home Z"), LineTag::Default);
        assert_eq!(LineTag::classify("G92 E0"), LineTag::Default);
    }

    #[test]
    fn test_marker_in_travel_comment_without_z_word() {
        // "Z" only in the comment
        assert_eq!(
            LineTag::classify("G1 X1 Y2 ; travel to Z seam"),
            LineTag::Travel
        );
    }
}
