//! G-code file reading and writing
//!
//! Lines keep their terminators so untouched lines are written back byte for
//! byte.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};
use vtpkit_core::Result;

/// Buffer size for reading and writing large files (256 KB)
const BUFFER_SIZE: usize = 256 * 1024;

/// Files above this size get a warning since the whole program is held in memory
const LARGE_FILE_WARNING: u64 = 500 * 1024 * 1024;

/// Read every line of a G-code file, terminators included
pub fn read_gcode_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    if size > LARGE_FILE_WARNING {
        warn!(
            "Reading very large file ({}MB) into memory",
            size / (1024 * 1024)
        );
    }

    let lines = read_lines_from(BufReader::with_capacity(BUFFER_SIZE, file))?;
    debug!("Read {} lines ({} bytes) from {}", lines.len(), size, path.display());
    Ok(lines)
}

/// Read lines from any buffered reader, terminators included
pub fn read_lines_from<R: BufRead>(mut reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Write lines as-is to a G-code file
pub fn write_gcode_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
    }
    writer.flush()?;
    debug!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}
