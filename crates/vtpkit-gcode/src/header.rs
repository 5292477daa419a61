//! Layer dimensions scraped from slicer header comments.

use regex::Regex;
use std::sync::OnceLock;

const LAYER_HEIGHT_MARKER: &str = "; layer_height = ";
const LAYER_WIDTH_MARKER: &str = ";layer_height = ";

/// Layer height and width found in a G-code header
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerInfo {
    /// From `; layer_height = <n>`
    pub layer_height: Option<f64>,
    /// From `;layer_height = <n>` (no space after `;`)
    pub layer_width: Option<f64>,
}

impl LayerInfo {
    /// Scan every line; the last occurrence of each marker wins
    pub fn scan<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut info = Self::default();
        for line in lines {
            let line = line.as_ref();
            if line.contains(LAYER_HEIGHT_MARKER) {
                if let Some(value) = first_number(line) {
                    info.layer_height = Some(value);
                }
            } else if line.contains(LAYER_WIDTH_MARKER) {
                if let Some(value) = first_number(line) {
                    info.layer_width = Some(value);
                }
            }
        }
        info
    }
}

fn first_number(line: &str) -> Option<f64> {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        NUMBER_REGEX.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("invalid regex pattern"));
    regex.find(line).and_then(|m| m.as_str().parse().ok())
}
