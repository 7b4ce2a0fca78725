//! Error types for star finding, image loading and export

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum StarfinderError {
    /// The pixel buffer (or a configuration value) cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A file could not be opened, created, read or written
    #[error("File I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Error while writing or parsing delimited detection records
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file is not a FITS primary image we can decode
    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    /// No loader is available for the file
    #[error("Unsupported image format: {0:?}")]
    UnsupportedFormat(PathBuf),

    /// Decoding error from the `image` crate
    #[cfg(feature = "image")]
    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    /// Export was requested before star finding was run
    #[error("No detections available; run star finding first")]
    NoDetections,
}

/// Result type for starfinder operations
pub type Result<T> = std::result::Result<T, StarfinderError>;

/// Convert a std::io::Error to StarfinderError with path context
pub fn io_err(path: impl Into<PathBuf>, err: std::io::Error) -> StarfinderError {
    StarfinderError::Io {
        path: path.into(),
        source: err,
    }
}
