//! Printing parameters and the extrusion model derived from them.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EvaluationError, Result};
use crate::options::ExtrusionCalibration;

/// Area of a circle with the given diameter
pub fn circle_area(diameter: f64) -> f64 {
    let radius = diameter / 2.0;
    std::f64::consts::PI * radius * radius
}

/// Parameters for the printing process
///
/// `layer_height` and `layer_width` are normally scraped from the G-code
/// header; a configured positive value is kept when the header has none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintingParameters {
    /// Bead width as a multiple of the nozzle diameter
    pub alpha: f64,
    /// Nozzle diameter (mm)
    pub nozzle_diameter: f64,
    /// Filament diameter (mm)
    pub filament_diameter: f64,
    /// Nominal extrusion rate
    pub e_dot: f64,
    /// Maximum planar length of a refined infill sub-segment (mm)
    pub eval_increment: f64,
    /// Sliced layer height (mm)
    pub layer_height: f64,
    /// Sliced layer width (mm)
    pub layer_width: f64,
    /// Constant Z shift applied to adjusted moves (mm)
    pub z_offset: f64,
    /// Feed rate for synthetic Z travel moves (mm/min)
    pub travel_speed: f64,
}

impl Default for PrintingParameters {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            nozzle_diameter: 0.4,
            filament_diameter: 1.75,
            e_dot: 250.0,
            eval_increment: 1.0,
            layer_height: 0.0,
            layer_width: 0.0,
            z_offset: -0.5,
            travel_speed: 15000.0,
        }
    }
}

impl PrintingParameters {
    /// Validate user-supplied parameters
    ///
    /// Layer height is not checked here since it usually arrives later from
    /// the G-code header; see [`ExtrusionModel::new`].
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("alpha", self.alpha),
            ("nozzle_diameter", self.nozzle_diameter),
            ("filament_diameter", self.filament_diameter),
            ("e_dot", self.e_dot),
            ("eval_increment", self.eval_increment),
            ("travel_speed", self.travel_speed),
        ];
        for (name, value) in checks {
            require_positive(name, value)?;
        }

        if !self.z_offset.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "z_offset must be finite, got {}",
                self.z_offset
            ))
            .into());
        }

        Ok(())
    }

    /// Apply layer dimensions scraped from a G-code header
    pub fn with_layer_info(mut self, layer_height: Option<f64>, layer_width: Option<f64>) -> Self {
        if let Some(height) = layer_height {
            self.layer_height = height;
        }
        if let Some(width) = layer_width {
            self.layer_width = width;
        }
        self
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    // NaN fails this comparison too
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            name: name.to_string(),
            value,
        }
        .into())
    }
}

/// Z, E and F computed for one adjusted move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOutput {
    /// Adjusted Z
    pub z: f64,
    /// Extrusion length
    pub e: f64,
    /// Feed rate
    pub f: f64,
}

/// Printing parameters with the derived cross-section areas cached once
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrusionModel {
    params: PrintingParameters,
    fil_area: f64,
    thread_area: f64,
    calibration: f64,
}

impl ExtrusionModel {
    /// Build the model, validating every parameter including layer height
    pub fn new(params: PrintingParameters, calibration: ExtrusionCalibration) -> Result<Self> {
        params.validate()?;
        if params.layer_height <= 0.0 || !params.layer_height.is_finite() {
            return Err(ConfigError::MissingLayerHeight.into());
        }

        let multiplier = calibration.multiplier(params.e_dot);
        require_positive("extrusion_calibration", multiplier)?;

        Ok(Self {
            params,
            fil_area: circle_area(params.filament_diameter),
            thread_area: circle_area(params.alpha * params.nozzle_diameter),
            calibration: multiplier,
        })
    }

    /// The underlying parameters
    pub fn params(&self) -> &PrintingParameters {
        &self.params
    }

    /// Filament cross-section area
    pub fn fil_area(&self) -> f64 {
        self.fil_area
    }

    /// Deposited thread cross-section area
    pub fn thread_area(&self) -> f64 {
        self.thread_area
    }

    /// Extrusion calibration multiplier in effect
    pub fn calibration(&self) -> f64 {
        self.calibration
    }

    /// Adjusted Z for a region height factor
    pub fn adjusted_z(&self, z_current: f64, h_star: f64) -> f64 {
        let h_new = h_star * self.params.alpha * self.params.nozzle_diameter;
        z_current + h_new - self.params.layer_height + self.params.z_offset
    }

    /// Feed rate for a region speed factor
    pub fn feed_rate(&self, v_star: f64) -> f64 {
        self.params.e_dot * v_star * self.fil_area / self.thread_area
    }

    /// Adjusted Z with finiteness checks, for travel moves
    pub fn travel_z(&self, z_current: f64, h_star: f64, region: usize) -> Result<f64> {
        check_finite("hStar", h_star, region)?;
        let z = self.adjusted_z(z_current, h_star);
        check_finite("adjusted Z", z, region)?;
        Ok(z)
    }

    /// Z, E and F for a planar segment of the given length
    ///
    /// Fails when a region factor or a derived value is non-finite, or when
    /// the feed rate is zero.
    pub fn segment(
        &self,
        length: f64,
        z_current: f64,
        v_star: f64,
        h_star: f64,
        region: usize,
    ) -> Result<SegmentOutput> {
        check_finite("vStar", v_star, region)?;
        check_finite("hStar", h_star, region)?;

        let f = self.feed_rate(v_star);
        check_finite("feed rate", f, region)?;
        if f == 0.0 {
            return Err(EvaluationError::ZeroFeedRate { region }.into());
        }

        let e = length * self.params.e_dot / f * self.calibration;
        check_finite("extrusion", e, region)?;

        let z = self.adjusted_z(z_current, h_star);
        check_finite("adjusted Z", z, region)?;

        Ok(SegmentOutput { z, e, f })
    }
}

fn check_finite(quantity: &'static str, value: f64, region: usize) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EvaluationError::NonFinite {
            quantity,
            value,
            region,
        }
        .into())
    }
}
