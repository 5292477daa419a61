//! Processing policies selected by the caller.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How per-line failures are handled during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Pass the offending line through unchanged and record the failure
    #[default]
    BestEffort,
    /// Abort the pass on the first failure
    Strict,
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BestEffort => write!(f, "best-effort"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Which Z feeds the classifier for an infill sub-segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationZ {
    /// The current layer Z
    #[default]
    Current,
    /// One layer height below the current layer Z
    BelowLayer,
}

impl ClassificationZ {
    /// Resolve the Z used for the representative point
    pub fn resolve(self, z_current: f64, layer_height: f64) -> f64 {
        match self {
            Self::Current => z_current,
            Self::BelowLayer => z_current - layer_height,
        }
    }
}

impl std::fmt::Display for ClassificationZ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::BelowLayer => write!(f, "below-layer"),
        }
    }
}

impl FromStr for ClassificationZ {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "below-layer" | "below_layer" => Ok(Self::BelowLayer),
            other => Err(format!(
                "unknown classification Z policy '{}' (expected current or below-layer)",
                other
            )),
        }
    }
}

/// Multiplier applied to computed extrusion lengths
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtrusionCalibration {
    /// No correction
    #[default]
    None,
    /// Empirically fitted curve over the nominal extrusion rate
    Empirical,
    /// A fixed multiplier
    Fixed(f64),
}

impl ExtrusionCalibration {
    /// Multiplier for a given nominal extrusion rate
    pub fn multiplier(self, e_dot: f64) -> f64 {
        match self {
            Self::None => 1.0,
            Self::Empirical => -285.93231 / (86.92217 + 1.00277_f64.powf(9.26 * e_dot)) + 4.41105,
            Self::Fixed(k) => k,
        }
    }
}

impl std::fmt::Display for ExtrusionCalibration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Empirical => write!(f, "empirical"),
            Self::Fixed(k) => write!(f, "{}", k),
        }
    }
}

impl FromStr for ExtrusionCalibration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "empirical" => Ok(Self::Empirical),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|k| k.is_finite() && *k > 0.0)
                .map(Self::Fixed)
                .ok_or_else(|| {
                    format!(
                        "unknown extrusion calibration '{}' (expected none, empirical, or a positive number)",
                        other
                    )
                }),
        }
    }
}

/// Options controlling a transformation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Drop nozzle-check lines instead of passing them through
    pub remove_nozzle_check: bool,
    /// Per-line failure handling
    pub error_policy: ErrorPolicy,
    /// Z used when classifying infill sub-segments
    pub classification_z: ClassificationZ,
    /// Extrusion length correction
    pub extrusion_calibration: ExtrusionCalibration,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            remove_nozzle_check: true,
            error_policy: ErrorPolicy::BestEffort,
            classification_z: ClassificationZ::Current,
            extrusion_calibration: ExtrusionCalibration::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_z_resolve() {
        assert_eq!(ClassificationZ::Current.resolve(1.0, 0.2), 1.0);
        assert!((ClassificationZ::BelowLayer.resolve(1.0, 0.2) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_multiplier() {
        assert_eq!(ExtrusionCalibration::None.multiplier(250.0), 1.0);
        assert_eq!(ExtrusionCalibration::Fixed(1.1).multiplier(250.0), 1.1);

        let k = ExtrusionCalibration::Empirical.multiplier(60.0);
        let expected = -285.93231 / (86.92217 + 1.00277_f64.powf(9.26 * 60.0)) + 4.41105;
        assert!((k - expected).abs() < 1e-12);
        assert!(k.is_finite());
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!(
            "below-layer".parse::<ClassificationZ>().unwrap(),
            ClassificationZ::BelowLayer
        );
        assert_eq!(
            "Empirical".parse::<ExtrusionCalibration>().unwrap(),
            ExtrusionCalibration::Empirical
        );
        assert_eq!(
            "1.25".parse::<ExtrusionCalibration>().unwrap(),
            ExtrusionCalibration::Fixed(1.25)
        );
        assert!("-2".parse::<ExtrusionCalibration>().is_err());
        assert!("sideways".parse::<ClassificationZ>().is_err());
    }

    #[test]
    fn test_defaults() {
        let options = ProcessingOptions::default();
        assert!(options.remove_nozzle_check);
        assert_eq!(options.error_policy, ErrorPolicy::BestEffort);
        assert_eq!(options.classification_z, ClassificationZ::Current);
        assert_eq!(options.extrusion_calibration, ExtrusionCalibration::None);
    }
}
