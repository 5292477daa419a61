//! # VTPKit G-code
//!
//! Move codec, line tagging, header scanning, infill refinement and the
//! stream transformer that rewrites a sliced program for variable thickness
//! printing.

pub mod codec;
pub mod file_io;
pub mod header;
pub mod refiner;
pub mod tags;
pub mod transformer;

pub use codec::{format, parse, split_annotation, Move};
pub use file_io::{read_gcode_lines, read_lines_from, write_gcode_lines};
pub use header::LayerInfo;
pub use refiner::{subdivide, SegmentRefiner};
pub use tags::LineTag;
pub use transformer::{
    parse_z_marker, LineIssue, TransformReport, TransformStats, Transformer, TransformerState,
};
