//! Open → find → export workflow state.
//!
//! A [`Session`] holds everything one user interaction needs: where the
//! image came from, the loaded pixels, and the latest detections. Front ends
//! (the CLI, or a GUI) keep a `Session` instead of storing these on widgets.
//!
//! ```no_run
//! use starfinder::{PeakFinderConfig, Session};
//!
//! let mut session = Session::open("m42.fits").unwrap();
//! let found = session.find_stars(&PeakFinderConfig::default()).unwrap().len();
//! println!("Found {found} stars");
//! session.export("m42_stars.csv").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Result, StarfinderError};
use crate::export::export_peaks;
use crate::fits::FitsHeader;
use crate::loader::load_image;
use crate::peak_finder::{find_peaks_with_config, PeakFinderConfig, PeakFinderResult};
use crate::pixel_buffer::PixelBuffer;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Session {
    source: Option<PathBuf>,
    image: PixelBuffer,
    header: Option<FitsHeader>,
    detections: Option<PeakFinderResult>,
}

impl Session {
    /// Load the image at `path` and start a session on it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let loaded = load_image(path)?;
        info!(
            path = %path.display(),
            rows = loaded.pixels.rows(),
            cols = loaded.pixels.cols(),
            "Opened image"
        );
        Ok(Self {
            source: Some(path.to_path_buf()),
            image: loaded.pixels,
            header: loaded.header,
            detections: None,
        })
    }

    /// Start a session on an in-memory image.
    pub fn from_buffer(image: PixelBuffer) -> Self {
        Self {
            source: None,
            image,
            header: None,
            detections: None,
        }
    }

    /// Run the peak finder on the loaded image, replacing earlier detections.
    pub fn find_stars(&mut self, config: &PeakFinderConfig) -> Result<&PeakFinderResult> {
        let result = find_peaks_with_config(&self.image, config)?;
        Ok(self.detections.insert(result))
    }

    /// Write the current detections to `path` as `row,col` lines.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let detections = self.detections.as_ref().ok_or(StarfinderError::NoDetections)?;
        let path = path.as_ref();
        export_peaks(path, &detections.coordinates())?;
        info!(path = %path.display(), count = detections.len(), "Exported detections");
        Ok(())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// FITS header of the source file, if it was a FITS file.
    pub fn header(&self) -> Option<&FitsHeader> {
        self.header.as_ref()
    }

    /// Result of the last [`Session::find_stars`], if any.
    pub fn detections(&self) -> Option<&PeakFinderResult> {
        self.detections.as_ref()
    }
}
