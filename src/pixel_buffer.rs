//! Row-major 2D intensity buffer
//!
//! A [`PixelBuffer`] is the input handed to the peak finder: `rows × cols`
//! double-precision intensities stored row by row. Row 0 is the first row of
//! the image data as stored on disk (for FITS, the first `NAXIS1`-long run).

use crate::error::{Result, StarfinderError};

#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl PixelBuffer {
    /// Wrap row-major pixel data.
    ///
    /// Fails with [`StarfinderError::InvalidInput`] if either dimension is zero
    /// or `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(StarfinderError::InvalidInput(format!(
                "pixel buffer must have at least one row and one column (got {rows}x{cols})"
            )));
        }
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            StarfinderError::InvalidInput(format!("pixel buffer {rows}x{cols} is too large"))
        })?;
        if data.len() != expected {
            return Err(StarfinderError::InvalidInput(format!(
                "pixel data length ({}) does not match rows*cols ({}x{}={})",
                data.len(),
                rows,
                cols,
                expected
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a buffer from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(StarfinderError::InvalidInput(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                ncols
            )));
        }
        Self::new(nrows, ncols, rows.into_iter().flatten().collect())
    }

    /// Buffer of the given shape with every pixel set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self> {
        Self::new(rows, cols, vec![value; rows.saturating_mul(cols)])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Pixel value, or `None` outside the buffer.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Overwrite a single pixel.
    ///
    /// Fails with [`StarfinderError::InvalidInput`] if `(row, col)` lies
    /// outside the buffer.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(StarfinderError::InvalidInput(format!(
                "pixel ({row}, {col}) is outside the {}x{} buffer",
                self.rows, self.cols
            )));
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Minimum and maximum over the finite pixels.
    ///
    /// Returns `None` when the buffer holds no finite value (e.g. an all-NaN
    /// FITS frame).
    pub fn extrema(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
