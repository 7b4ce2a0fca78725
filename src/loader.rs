//! Load an image file into a [`PixelBuffer`], choosing the reader by extension.
//!
//! FITS files (`.fits`, `.fit`, `.fts`, case-insensitive) are always supported.
//! With the `image` feature enabled, any raster the `image` crate can decode
//! (PNG, TIFF, JPEG, ...) is converted to luminance.

use std::path::Path;

use crate::error::Result;
use crate::fits::{read_fits, FitsHeader};
use crate::pixel_buffer::PixelBuffer;

/// An image ready for star finding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: PixelBuffer,
    /// FITS header, when the source was a FITS file.
    pub header: Option<FitsHeader>,
}

/// True if `path` has a FITS file extension.
pub fn is_fits_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "fits" | "fit" | "fts"))
        .unwrap_or(false)
}

/// Load the image at `path`.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<LoadedImage> {
    let path = path.as_ref();
    if is_fits_path(path) {
        let fits = read_fits(path)?;
        return Ok(LoadedImage {
            pixels: fits.pixels,
            header: Some(fits.header),
        });
    }
    load_raster(path)
}

#[cfg(feature = "image")]
fn load_raster(path: &Path) -> Result<LoadedImage> {
    use image::GenericImageView;

    let img = image::open(path)?;
    let (width, height) = img.dimensions();
    let pixels = PixelBuffer::new(height as usize, width as usize, to_grayscale_f64(&img))?;
    tracing::debug!(path = %path.display(), width, height, "Loaded raster image");
    Ok(LoadedImage {
        pixels,
        header: None,
    })
}

#[cfg(not(feature = "image"))]
fn load_raster(path: &Path) -> Result<LoadedImage> {
    Err(crate::error::StarfinderError::UnsupportedFormat(path.to_path_buf()))
}

/// Convert an image to single-channel `f64` luminance (Rec. 709 weights).
/// 16-bit and float data keep their native scale.
#[cfg(feature = "image")]
pub fn to_grayscale_f64(img: &image::DynamicImage) -> Vec<f64> {
    use image::DynamicImage;

    fn luma(r: f64, g: f64, b: f64) -> f64 {
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    match img {
        DynamicImage::ImageLuma16(g) => g.as_raw().iter().map(|&v| v as f64).collect(),
        DynamicImage::ImageLumaA16(g) => g.pixels().map(|p| p.0[0] as f64).collect(),
        DynamicImage::ImageRgb16(rgb) => rgb
            .pixels()
            .map(|p| luma(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64))
            .collect(),
        DynamicImage::ImageRgba16(rgba) => rgba
            .pixels()
            .map(|p| luma(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64))
            .collect(),
        DynamicImage::ImageRgb32F(rgb) => rgb
            .pixels()
            .map(|p| luma(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64))
            .collect(),
        DynamicImage::ImageRgba32F(rgba) => rgba
            .pixels()
            .map(|p| luma(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64))
            .collect(),
        _ => img.to_luma8().as_raw().iter().map(|&v| v as f64).collect(),
    }
}
