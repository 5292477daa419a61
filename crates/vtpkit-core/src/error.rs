//! Error handling for VTPKit
//!
//! Errors are grouped by the stage that raises them:
//! - Configuration errors (parameters, function files, region alignment)
//! - Parse errors (malformed G-code lines)
//! - Geometry errors (unusable region data)
//! - Evaluation errors (region lookup and function evaluation)
//!
//! Parse and evaluation errors are recoverable per line; the others abort a run.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Configuration error type
///
/// Raised before any line is processed. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter that must be strictly positive is not
    #[error("Parameter '{name}' must be positive, got {value}")]
    NonPositive {
        /// The parameter name.
        name: String,
        /// The rejected value.
        value: f64,
    },

    /// A region function definition line is malformed
    #[error("Invalid function definition at line {line_number}: {reason}")]
    InvalidFunction {
        /// 1-based line number in the function source.
        line_number: usize,
        /// Why the line was rejected.
        reason: String,
    },

    /// The function source produced no definitions
    #[error("No region functions found in {source_name}")]
    NoFunctions {
        /// Name of the function source (usually a path).
        source_name: String,
    },

    /// Region source and function source disagree on the number of regions
    #[error("Region count mismatch: {regions} regions but {functions} function pairs")]
    RegionCountMismatch {
        /// Number of solids loaded.
        regions: usize,
        /// Number of function pairs loaded.
        functions: usize,
    },

    /// The G-code header carried no layer height and none was configured
    #[error("Layer height not found in G-code header and not configured")]
    MissingLayerHeight,

    /// The configuration file format is not supported
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The configuration file could not be decoded
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// G-code parse error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The line is empty or whitespace only
    #[error("Empty or invalid G-code line")]
    EmptyLine,

    /// An axis letter is followed by something that is not a number
    #[error("Invalid {axis} coordinate: '{text}'")]
    MalformedCoordinate {
        /// The axis letter.
        axis: char,
        /// The offending text following the axis letter.
        text: String,
    },

    /// A `;Z:` marker without a readable value
    #[error("Invalid Z marker: '{text}'")]
    MalformedZMarker {
        /// The marker text.
        text: String,
    },

    /// A move needed for a computation lacks an axis value
    #[error("Move at line {line_number} has no {axis} coordinate")]
    MissingAxis {
        /// 1-based line number of the incomplete move.
        line_number: usize,
        /// The missing axis letter.
        axis: char,
    },
}

/// Geometry error type
///
/// Indicates unusable region data. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Classification was attempted against an empty region set
    #[error("Region set is empty")]
    EmptyRegionSet,

    /// A mesh without any faces
    #[error("Mesh has no faces: {0}")]
    EmptyMesh(String),

    /// A solid with impossible dimensions
    #[error("Invalid solid: {0}")]
    InvalidSolid(String),

    /// A mesh or region manifest could not be read
    #[error("Failed to load regions from {path}: {reason}")]
    Load {
        /// The source path.
        path: String,
        /// The reason loading failed.
        reason: String,
    },
}

/// Evaluation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Region id is not a valid index into the region table
    #[error("Region {region} out of range (0..{count})")]
    RegionOutOfRange {
        /// The requested region id.
        region: usize,
        /// Number of regions loaded.
        count: usize,
    },

    /// A query point with a NaN or infinite coordinate
    #[error("Non-finite point ({x}, {y}, {z})")]
    NonFinitePoint {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
    },

    /// A region function or a value derived from it is NaN or infinite
    #[error("{quantity} is non-finite ({value}) in region {region}")]
    NonFinite {
        /// Which quantity went non-finite.
        quantity: &'static str,
        /// The value produced.
        value: f64,
        /// The region whose functions were evaluated.
        region: usize,
    },

    /// The computed feed rate is zero, which would divide by zero
    #[error("Feed rate evaluated to zero in region {region}")]
    ZeroFeedRate {
        /// The region whose functions were evaluated.
        region: usize,
    },

    /// A move would be refined into more sub-moves than allowed
    #[error("Move of length {length} needs more than {limit} sub-moves of at most {max_length}")]
    TooManySegments {
        /// Planar length of the move.
        length: f64,
        /// Maximum sub-move length.
        max_length: f64,
        /// Sub-move limit.
        limit: usize,
    },
}

/// Main error type for VTPKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Evaluation error
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// An error tied to a specific input line
    #[error("line {line_number}: {source}")]
    AtLine {
        /// 1-based line number.
        line_number: usize,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach a 1-based line number to this error
    pub fn at_line(self, line_number: usize) -> Self {
        Error::AtLine {
            line_number,
            source: Box::new(self),
        }
    }

    /// Whether a best-effort pass may skip over this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Parse(_) | Error::Evaluation(_) => true,
            Error::AtLine { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self.root(), Error::Config(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self.root(), Error::Geometry(_))
    }

    /// The error with any line context removed
    pub fn root(&self) -> &Error {
        match self {
            Error::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
