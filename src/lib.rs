//! # starfinder
//!
//! Locate bright point sources ("stars") in astronomical images with a greedy
//! peak search, and write their pixel positions out as plain text.
//!
//! Given an image, `starfinder` repeatedly picks the brightest remaining
//! pixel, records its `(row, col)` position and blanks a square window around
//! it, until what is left falls below the image's dynamic range
//! (`max - min`). No background model, no PSF fitting: it is a quick way to
//! pull out the obvious stars from a frame.
//!
//! ## Features
//!
//! - **FITS input**: native reader for primary-HDU images (`BITPIX` 8/16/32/64/-32/-64,
//!   `BSCALE`/`BZERO`), header keywords kept alongside the pixels
//! - **Other rasters**: PNG, TIFF, JPEG, ... through the optional `image` feature
//! - **Bounded**: every search terminates, with a configurable iteration cap on top
//! - **CSV export**: one `row,col` line per detection
//!
//! ## Example
//!
//! ```no_run
//! use starfinder::{find_peaks_with_config, read_fits, export_peaks, PeakFinderConfig};
//!
//! let image = read_fits("data/m42.fits").unwrap();
//!
//! let config = PeakFinderConfig {
//!     suppression_radius: 8,
//!     ..Default::default()
//! };
//! let result = find_peaks_with_config(&image.pixels, &config).unwrap();
//! println!(
//!     "Found {} stars in {} passes (threshold {})",
//!     result.len(),
//!     result.iterations,
//!     result.threshold
//! );
//!
//! export_peaks("data/m42_stars.csv", &result.coordinates()).unwrap();
//! ```
//!
//! ## Algorithm overview
//!
//! 1. **Extrema**: global minimum and maximum of the finite pixels
//! 2. **Padding**: the image is copied into a scratch buffer with
//!    `suppression_radius` zero rows and columns appended, so windows near
//!    the edges stay in bounds
//! 3. **Scan**: every pixel exactly equal to the current maximum is recorded,
//!    row-major, and a `2r × 2r` window around it is zeroed
//! 4. **Repeat**: the maximum is recomputed; the search stops once it drops
//!    below `global_max - global_min`
//!
//! Each pass is a full scan of the image, so the cost is `O(k·rows·cols)` for
//! `k` passes. Run it off the UI thread for large frames.
//!

pub mod error;
pub mod export;
pub mod fits;
pub mod loader;
pub mod peak_finder;
pub mod pixel_buffer;
pub mod session;

pub use error::{Result, StarfinderError};
pub use export::{export_peaks, import_peaks, read_peaks, write_peaks};
pub use fits::{parse_fits, read_fits, FitsHeader, FitsImage, HeaderValue};
pub use loader::{load_image, LoadedImage};
pub use peak_finder::{
    find_peaks, find_peaks_from_raw, find_peaks_with_config, Peak, PeakFinderConfig,
    PeakFinderResult,
};
pub use pixel_buffer::PixelBuffer;
pub use session::Session;
