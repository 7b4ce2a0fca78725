//! Write detections as delimited text and read them back.
//!
//! The format is one detection per line, `row,col`, with no header row:
//!
//! ```text
//! 10,10
//! 15,15
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{io_err, Result, StarfinderError};
use tracing::debug;

/// Write `(row, col)` pairs to `sink`, one `row,col` record per line.
pub fn write_peaks<W: Write>(coords: &[(usize, usize)], sink: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    for &(row, col) in coords {
        wtr.serialize((row, col))?;
    }
    wtr.flush().map_err(|e| StarfinderError::Csv(e.into()))?;
    Ok(())
}

/// Create (or truncate) `path` and write the detections to it.
pub fn export_peaks<P: AsRef<Path>>(path: P, coords: &[(usize, usize)]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| io_err(path, e))?;
    write_peaks(coords, file)?;
    debug!(path = %path.display(), count = coords.len(), "Exported detections");
    Ok(())
}

/// Parse `row,col` records from `source`.
pub fn read_peaks<R: Read>(source: R) -> Result<Vec<(usize, usize)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(source);
    rdr.deserialize::<(usize, usize)>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()
        .map_err(|e| e.into())
}

/// Read detections previously written by [`export_peaks`].
pub fn import_peaks<P: AsRef<Path>>(path: P) -> Result<Vec<(usize, usize)>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    read_peaks(file)
}
