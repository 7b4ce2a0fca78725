//! Locate bright point sources by iterative global-maximum suppression.
//!
//! The finder repeatedly takes the brightest remaining pixel, records it, and
//! blanks a square window around it so the same star cannot be picked twice:
//!
//! 1. Compute the global minimum and maximum of the image
//! 2. Copy the image into a working buffer padded with `suppression_radius`
//!    zero rows (bottom) and zero columns (right)
//! 3. While the current maximum is `>= global_max - global_min`:
//!    - scan the image region row by row; every pixel exactly equal to the
//!      current maximum is recorded and the window
//!      `[row - radius, row + radius) × [col - radius, col + radius)` is zeroed
//!    - recompute the maximum of what remains
//!
//! Every pixel equal to the current maximum in a pass is recorded, so two
//! equally bright stars (or a flat-topped saturated star wider than the
//! window) produce several detections in the same pass.
//!
//! # Example
//!
//! ```
//! use starfinder::{find_peaks, PixelBuffer};
//!
//! let mut image = PixelBuffer::filled(20, 20, 0.0).unwrap();
//! image.set(10, 10, 100.0).unwrap();
//!
//! let result = find_peaks(&image).unwrap();
//! assert_eq!(result.coordinates(), vec![(10, 10)]);
//! ```

use crate::error::{Result, StarfinderError};
use crate::pixel_buffer::PixelBuffer;
use tracing::{debug, info, warn};

/// Configuration for the peak finder.
#[derive(Debug, Clone)]
pub struct PeakFinderConfig {
    /// Half-width of the square suppression window, in pixels.
    /// After a detection at `(r, c)` the window
    /// `[r - radius, r + radius) × [c - radius, c + radius)` is zeroed.
    /// Should be at least the radius of a star's point-spread function.
    /// Default: 10 (a 20×20 window)
    pub suppression_radius: usize,

    /// Maximum number of scan passes before giving up.
    ///
    /// The search always terminates on its own, but on large or
    /// pathological images it can take up to one pass per pixel. When the
    /// cap is reached the detections found so far are returned and
    /// [`PeakFinderResult::iteration_cap_hit`] is set.
    ///
    /// `None` disables the cap.
    ///
    /// Default: Some(10_000)
    pub max_iterations: Option<usize>,
}

impl Default for PeakFinderConfig {
    fn default() -> Self {
        Self {
            suppression_radius: 10,
            max_iterations: Some(10_000),
        }
    }
}

/// A single detected source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Row index in the input image (0 = first stored row)
    pub row: usize,
    /// Column index in the input image
    pub col: usize,
    /// Pixel value at detection time
    pub value: f64,
}

/// Result of a peak search, containing the detections and diagnostic info.
#[derive(Debug, Clone)]
pub struct PeakFinderResult {
    /// Detections in the order they were found: by pass, then row-major.
    pub peaks: Vec<Peak>,

    /// Minimum finite pixel value of the input.
    pub global_min: f64,

    /// Maximum finite pixel value of the input.
    pub global_max: f64,

    /// Detection floor, `global_max - global_min`.
    pub threshold: f64,

    /// Number of scan passes executed.
    pub iterations: usize,

    /// True if the search stopped because `max_iterations` was reached.
    pub iteration_cap_hit: bool,
}

impl PeakFinderResult {
    /// Detected `(row, col)` pairs in detection order.
    pub fn coordinates(&self) -> Vec<(usize, usize)> {
        self.peaks.iter().map(|p| (p.row, p.col)).collect()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

/// Find peaks with the default configuration.
pub fn find_peaks(buffer: &PixelBuffer) -> Result<PeakFinderResult> {
    find_peaks_with_config(buffer, &PeakFinderConfig::default())
}

/// Find peaks in raw row-major pixel data.
///
/// This is useful when the pixels come from a camera SDK or a FITS reader
/// other than [`crate::fits`].
///
/// # Arguments
///
/// * `pixels` - Row-major values (length must equal `rows * cols`)
/// * `rows` - Number of image rows
/// * `cols` - Number of image columns
/// * `config` - Search parameters
pub fn find_peaks_from_raw(
    pixels: &[f64],
    rows: usize,
    cols: usize,
    config: &PeakFinderConfig,
) -> Result<PeakFinderResult> {
    let buffer = PixelBuffer::new(rows, cols, pixels.to_vec())?;
    find_peaks_with_config(&buffer, config)
}

/// Find peaks in `buffer`.
///
/// Fails with [`StarfinderError::InvalidInput`] if the configuration is
/// unusable or the buffer contains no finite pixel. Non-finite pixels (FITS
/// blanks) are ignored: they take no part in the extrema and are never
/// detected.
pub fn find_peaks_with_config(
    buffer: &PixelBuffer,
    config: &PeakFinderConfig,
) -> Result<PeakFinderResult> {
    if config.suppression_radius == 0 {
        return Err(StarfinderError::InvalidInput(
            "suppression_radius must be at least 1".to_string(),
        ));
    }
    if config.max_iterations == Some(0) {
        return Err(StarfinderError::InvalidInput(
            "max_iterations must be at least 1".to_string(),
        ));
    }

    let (rows, cols) = buffer.shape();
    let (global_min, global_max) = buffer.extrema().ok_or_else(|| {
        StarfinderError::InvalidInput("pixel buffer contains no finite values".to_string())
    })?;
    let threshold = global_max - global_min;

    if threshold == 0.0 {
        warn!(
            rows,
            cols,
            value = global_max,
            "Flat image: detection threshold is zero, every pixel is a candidate"
        );
    }

    let mut work = WorkingBuffer::new(buffer, config.suppression_radius);
    let mut peaks = Vec::new();
    let mut iterations = 0usize;
    let mut iteration_cap_hit = false;
    let mut current_max = Some(global_max);

    while let Some(level) = current_max.filter(|&m| m >= threshold) {
        if let Some(cap) = config.max_iterations {
            if iterations >= cap {
                warn!(
                    cap,
                    detections = peaks.len(),
                    "Peak search stopped at iteration cap"
                );
                iteration_cap_hit = true;
                break;
            }
        }
        iterations += 1;

        let before = peaks.len();
        for row in 0..rows {
            for col in 0..cols {
                if work.is_candidate(row, col) && work.value(row, col) == level {
                    peaks.push(Peak {
                        row,
                        col,
                        value: level,
                    });
                    work.suppress(row, col);
                }
            }
        }
        debug!(
            iteration = iterations,
            level,
            found = peaks.len() - before,
            "Peak search pass"
        );

        current_max = work.max_candidate();
    }

    info!(
        detections = peaks.len(),
        iterations, threshold, "Peak search complete"
    );

    Ok(PeakFinderResult {
        peaks,
        global_min,
        global_max,
        threshold,
        iterations,
        iteration_cap_hit,
    })
}

// ─── Internal helpers ──────────────────────────────────────────────────────

/// Padded scratch copy of the image.
///
/// Cells zeroed by a suppression window are also marked consumed and are
/// never candidates again. For a positive threshold this is the same as
/// plain zeroing; for a flat image (threshold 0) it guarantees that each
/// pass consumes at least one pixel, so the search ends.
struct WorkingBuffer {
    rows: usize,
    cols: usize,
    radius: usize,
    stride: usize,
    padded_rows: usize,
    values: Vec<f64>,
    consumed: Vec<bool>,
}

impl WorkingBuffer {
    fn new(buffer: &PixelBuffer, radius: usize) -> Self {
        let (rows, cols) = buffer.shape();
        let stride = cols + radius;
        let padded_rows = rows + radius;
        let mut values = vec![0.0f64; padded_rows * stride];
        let mut consumed = vec![false; padded_rows * stride];

        for (row, src) in buffer.as_slice().chunks_exact(cols).enumerate() {
            let off = row * stride;
            for (col, &v) in src.iter().enumerate() {
                if v.is_finite() {
                    values[off + col] = v;
                } else {
                    consumed[off + col] = true;
                }
            }
        }

        Self {
            rows,
            cols,
            radius,
            stride,
            padded_rows,
            values,
            consumed,
        }
    }

    fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.stride + col]
    }

    fn is_candidate(&self, row: usize, col: usize) -> bool {
        !self.consumed[row * self.stride + col]
    }

    /// Zero the window around `(row, col)`, clipped to the padded extent.
    fn suppress(&mut self, row: usize, col: usize) {
        let r0 = row.saturating_sub(self.radius);
        let r1 = (row + self.radius).min(self.padded_rows);
        let c0 = col.saturating_sub(self.radius);
        let c1 = (col + self.radius).min(self.stride);
        for r in r0..r1 {
            let off = r * self.stride;
            self.values[off + c0..off + c1].fill(0.0);
            self.consumed[off + c0..off + c1].fill(true);
        }
    }

    /// Maximum over the image region's remaining candidates.
    fn max_candidate(&self) -> Option<f64> {
        (0..self.rows)
            .flat_map(|r| {
                let off = r * self.stride;
                (off..off + self.cols).filter(|&i| !self.consumed[i])
            })
            .map(|i| self.values[i])
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(rows: usize, cols: usize) -> PixelBuffer {
        PixelBuffer::filled(rows, cols, 0.0).unwrap()
    }

    #[test]
    fn test_single_peak() {
        let mut image = zeros(20, 20);
        image.set(10, 10, 100.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.coordinates(), vec![(10, 10)]);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.global_min, 0.0);
        assert_eq!(result.global_max, 100.0);
        assert_eq!(result.threshold, 100.0);
        assert!(!result.iteration_cap_hit);
        assert_eq!(result.peaks[0].value, 100.0);
    }

    #[test]
    fn test_equal_peaks_found_in_one_pass() {
        let mut image = zeros(20, 20);
        image.set(2, 2, 50.0).unwrap();
        image.set(15, 15, 50.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.threshold, 50.0);
        // Both ties are recorded during the first row-major scan
        assert_eq!(result.coordinates(), vec![(2, 2), (15, 15)]);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_tie_inside_window_is_suppressed() {
        // Second pixel lies inside the first one's window, so it is zeroed
        // before the scan reaches it.
        let mut image = zeros(30, 30);
        image.set(5, 5, 9.0).unwrap();
        image.set(8, 12, 9.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.coordinates(), vec![(5, 5)]);
    }

    #[test]
    fn test_flat_image_terminates() {
        let image = PixelBuffer::filled(5, 5, 7.0).unwrap();
        let result = find_peaks(&image).unwrap();

        assert_eq!(result.threshold, 0.0);
        assert_eq!(result.coordinates(), vec![(0, 0)]);
        assert_eq!(result.iterations, 1);
        assert!(!result.iteration_cap_hit);
    }

    #[test]
    fn test_flat_zero_image_tiles_windows() {
        let image = zeros(30, 30);
        let result = find_peaks(&image).unwrap();

        let expected: Vec<(usize, usize)> = [0, 10, 20]
            .iter()
            .flat_map(|&r| [0, 10, 20].iter().map(move |&c| (r, c)))
            .collect();
        assert_eq!(result.coordinates(), expected);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_edge_peaks_use_padding() {
        let mut image = zeros(12, 12);
        image.set(11, 11, 10.0).unwrap();
        image.set(0, 0, 10.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.coordinates(), vec![(0, 0), (11, 11)]);
    }

    #[test]
    fn test_fainter_star_below_threshold() {
        // Threshold is the dynamic range (100), so the 60 star is not reported.
        let mut image = zeros(40, 40);
        image.set(5, 5, 100.0).unwrap();
        image.set(30, 30, 60.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.coordinates(), vec![(5, 5)]);
    }

    #[test]
    fn test_offset_background_detects_multiple_levels() {
        // Background 50, stars 130 and 120: threshold 80, both qualify.
        let mut image = PixelBuffer::filled(40, 40, 50.0).unwrap();
        image.set(5, 5, 130.0).unwrap();
        image.set(30, 30, 120.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.threshold, 80.0);
        assert_eq!(result.coordinates(), vec![(5, 5), (30, 30)]);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.peaks[1].value, 120.0);
    }

    #[test]
    fn test_custom_radius() {
        let mut image = zeros(20, 20);
        image.set(4, 4, 10.0).unwrap();
        image.set(4, 7, 10.0).unwrap();

        let wide = find_peaks(&image).unwrap();
        assert_eq!(wide.coordinates(), vec![(4, 4)]);

        let config = PeakFinderConfig {
            suppression_radius: 2,
            ..Default::default()
        };
        let narrow = find_peaks_with_config(&image, &config).unwrap();
        assert_eq!(narrow.coordinates(), vec![(4, 4), (4, 7)]);
    }

    #[test]
    fn test_iteration_cap() {
        // Background 50 puts the threshold at 50, so all four stars qualify.
        let mut image = PixelBuffer::filled(60, 60, 50.0).unwrap();
        image.set(5, 5, 100.0).unwrap();
        image.set(5, 40, 99.0).unwrap();
        image.set(40, 5, 98.0).unwrap();
        image.set(40, 40, 97.0).unwrap();

        let config = PeakFinderConfig {
            max_iterations: Some(2),
            ..Default::default()
        };
        let result = find_peaks_with_config(&image, &config).unwrap();
        assert!(result.iteration_cap_hit);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.coordinates(), vec![(5, 5), (5, 40)]);
    }

    #[test]
    fn test_non_finite_pixels_ignored() {
        let mut image = zeros(20, 20);
        image.set(3, 3, f64::NAN).unwrap();
        image.set(12, 12, 5.0).unwrap();

        let result = find_peaks(&image).unwrap();
        assert_eq!(result.coordinates(), vec![(12, 12)]);

        let blank = PixelBuffer::filled(4, 4, f64::NAN).unwrap();
        assert!(matches!(
            find_peaks(&blank),
            Err(StarfinderError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let image = zeros(4, 4);
        let config = PeakFinderConfig {
            suppression_radius: 0,
            ..Default::default()
        };
        assert!(find_peaks_with_config(&image, &config).is_err());

        let config = PeakFinderConfig {
            max_iterations: Some(0),
            ..Default::default()
        };
        assert!(find_peaks_with_config(&image, &config).is_err());
    }

    #[test]
    fn test_from_raw_length_mismatch() {
        let err = find_peaks_from_raw(&[1.0; 5], 2, 3, &PeakFinderConfig::default()).unwrap_err();
        assert!(matches!(err, StarfinderError::InvalidInput(_)));
    }
}
