//! Per-region function definitions.
//!
//! One definition per line, `vStar ; hStar`, in region order. Blank lines and
//! lines starting with `#` are skipped.

use std::path::Path;
use tracing::{debug, info};
use vtpkit_core::{ConfigError, EvaluationError, Result};

use crate::expr::Expr;

/// The two compiled expressions of one region
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionPair {
    /// Speed factor
    pub v_star: Expr,
    /// Height factor
    pub h_star: Expr,
    /// 1-based line of the definition in its source
    pub line_number: usize,
}

impl FunctionPair {
    /// Evaluate both expressions, returning `(vStar, hStar)`
    pub fn evaluate(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        (self.v_star.eval(x, y, z), self.h_star.eval(x, y, z))
    }
}

/// Ordered function pairs, index `i` belonging to region `i`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTable {
    pairs: Vec<FunctionPair>,
}

impl FunctionTable {
    /// Parse definitions from text
    ///
    /// `source_name` only appears in error messages.
    pub fn parse(text: &str, source_name: &str) -> Result<Self> {
        let mut pairs = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let invalid = |reason: String| ConfigError::InvalidFunction {
                line_number,
                reason,
            };

            let fields: Vec<&str> = line.split(';').map(str::trim).collect();
            let [v_text, h_text] = fields.as_slice() else {
                return Err(invalid(format!(
                    "expected 'vStar ; hStar', found {} field(s)",
                    fields.len()
                ))
                .into());
            };
            if v_text.is_empty() || h_text.is_empty() {
                return Err(invalid("empty expression".to_string()).into());
            }

            let v_star = Expr::parse(v_text).map_err(|e| invalid(format!("vStar: {}", e)))?;
            let h_star = Expr::parse(h_text).map_err(|e| invalid(format!("hStar: {}", e)))?;
            debug!(
                "Region {} functions: vStar = {}, hStar = {}",
                pairs.len(),
                v_star,
                h_star
            );

            pairs.push(FunctionPair {
                v_star,
                h_star,
                line_number,
            });
        }

        if pairs.is_empty() {
            return Err(ConfigError::NoFunctions {
                source_name: source_name.to_string(),
            }
            .into());
        }

        Ok(Self { pairs })
    }

    /// Load definitions from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::parse(&text, &path.display().to_string())?;
        info!(
            "Loaded {} region function pair(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, region: usize) -> Option<&FunctionPair> {
        self.pairs.get(region)
    }

    /// Evaluate the pair of `region` at a point
    pub fn evaluate(&self, region: usize, x: f64, y: f64, z: f64) -> Result<(f64, f64)> {
        let pair = self.get(region).ok_or(EvaluationError::RegionOutOfRange {
            region,
            count: self.len(),
        })?;
        Ok(pair.evaluate(x, y, z))
    }

    pub(crate) fn into_pairs(self) -> Vec<FunctionPair> {
        self.pairs
    }
}
