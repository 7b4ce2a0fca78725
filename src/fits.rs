//! Minimal FITS reader for primary-HDU images.
//!
//! Reads the header cards of the primary HDU and decodes its data unit into a
//! [`PixelBuffer`]. Only what a star search needs is supported:
//!
//! - `BITPIX` 8, 16, 32, 64 (integers) and -32, -64 (IEEE floats), big-endian
//! - `BSCALE` / `BZERO` scaling (`physical = BZERO + BSCALE * raw`)
//! - two image axes; further axes must have length 1
//!
//! `NAXIS1` is the number of columns and `NAXIS2` the number of rows, so row 0
//! of the buffer is the first row stored in the file. World-coordinate
//! keywords (`CTYPEn`, `CRVALn`, `CRPIXn`, `CDELTn`, ...) are kept in the
//! [`FitsHeader`] untouched for display code; they play no part in detection.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{io_err, Result, StarfinderError};
use crate::pixel_buffer::PixelBuffer;
use tracing::debug;

const BLOCK_LEN: usize = 2880;
const CARD_LEN: usize = 80;

/// Value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Keyword/value pairs of a FITS header.
///
/// `COMMENT`, `HISTORY` and blank cards are not kept. Keywords appear in
/// [`FitsHeader::keywords`] in file order.
#[derive(Debug, Clone, Default)]
pub struct FitsHeader {
    order: Vec<String>,
    values: HashMap<String, HeaderValue>,
}

impl FitsHeader {
    fn insert(&mut self, key: String, value: HeaderValue) {
        if self.values.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.values.get(key)
    }

    /// Numeric value as `f64`; integer cards are widened.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(HeaderValue::Float(f)) => Some(*f),
            Some(HeaderValue::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(HeaderValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(HeaderValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(HeaderValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Keywords in the order they appear in the file.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A decoded primary image and its header.
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub header: FitsHeader,
    pub pixels: PixelBuffer,
}

/// Read the primary image of the FITS file at `path`.
pub fn read_fits<P: AsRef<Path>>(path: P) -> Result<FitsImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let image = parse_fits(&bytes)?;
    debug!(
        path = %path.display(),
        rows = image.pixels.rows(),
        cols = image.pixels.cols(),
        keywords = image.header.len(),
        "Loaded FITS primary image"
    );
    Ok(image)
}

/// Decode the primary image from an in-memory FITS file.
pub fn parse_fits(bytes: &[u8]) -> Result<FitsImage> {
    let (header, data_offset) = parse_header(bytes)?;

    if header.get_bool("SIMPLE") != Some(true) {
        return Err(StarfinderError::InvalidFits(
            "primary header does not start with SIMPLE = T".to_string(),
        ));
    }

    let bitpix = header
        .get_i64("BITPIX")
        .ok_or_else(|| StarfinderError::InvalidFits("missing BITPIX".to_string()))?;
    let sample = SampleType::from_bitpix(bitpix)?;

    let naxis = header
        .get_i64("NAXIS")
        .ok_or_else(|| StarfinderError::InvalidFits("missing NAXIS".to_string()))?;
    if naxis < 2 {
        return Err(StarfinderError::InvalidFits(format!(
            "primary HDU has NAXIS = {naxis}, expected an image with at least 2 axes"
        )));
    }
    let axis_len = |i: i64| -> Result<usize> {
        let key = format!("NAXIS{i}");
        header
            .get_i64(&key)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| StarfinderError::InvalidFits(format!("missing or invalid {key}")))
    };
    let cols = axis_len(1)?;
    let rows = axis_len(2)?;
    for i in 3..=naxis {
        let n = axis_len(i)?;
        if n != 1 {
            return Err(StarfinderError::InvalidFits(format!(
                "NAXIS{i} = {n}; only single-plane images are supported"
            )));
        }
    }

    let npixels = rows.checked_mul(cols).ok_or_else(|| {
        StarfinderError::InvalidFits(format!("image {rows}x{cols} is too large"))
    })?;
    let data_len = npixels.checked_mul(sample.bytes()).ok_or_else(|| {
        StarfinderError::InvalidFits(format!("data unit of {rows}x{cols} pixels is too large"))
    })?;
    let data_end = data_offset.checked_add(data_len).ok_or_else(|| {
        StarfinderError::InvalidFits(format!("data unit of {data_len} bytes is too large"))
    })?;
    let data = bytes
        .get(data_offset..data_end)
        .ok_or_else(|| {
            StarfinderError::InvalidFits(format!(
                "data unit truncated: need {} bytes after header, file has {}",
                data_len,
                bytes.len().saturating_sub(data_offset)
            ))
        })?;

    let bscale = header.get_f64("BSCALE").unwrap_or(1.0);
    let bzero = header.get_f64("BZERO").unwrap_or(0.0);
    let pixels: Vec<f64> = data
        .chunks_exact(sample.bytes())
        .map(|raw| {
            let v = sample.decode(raw);
            bzero + bscale * v
        })
        .collect();

    let pixels = PixelBuffer::new(rows, cols, pixels)?;
    Ok(FitsImage { header, pixels })
}

// ─── Internal helpers ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum SampleType {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleType {
    fn from_bitpix(bitpix: i64) -> Result<Self> {
        match bitpix {
            8 => Ok(Self::U8),
            16 => Ok(Self::I16),
            32 => Ok(Self::I32),
            64 => Ok(Self::I64),
            -32 => Ok(Self::F32),
            -64 => Ok(Self::F64),
            other => Err(StarfinderError::InvalidFits(format!(
                "unsupported BITPIX {other}"
            ))),
        }
    }

    fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }

    /// Decode one big-endian sample. `raw.len()` equals `self.bytes()`.
    fn decode(self, raw: &[u8]) -> f64 {
        let mut buf = [0u8; 8];
        buf[..raw.len()].copy_from_slice(raw);
        match self {
            Self::U8 => raw[0] as f64,
            Self::I16 => i16::from_be_bytes([buf[0], buf[1]]) as f64,
            Self::I32 => i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            Self::I64 => i64::from_be_bytes(buf) as f64,
            Self::F32 => f32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as f64,
            Self::F64 => f64::from_be_bytes(buf),
        }
    }
}

/// Parse header blocks up to `END`. Returns the header and the byte offset of
/// the data unit.
fn parse_header(bytes: &[u8]) -> Result<(FitsHeader, usize)> {
    let mut header = FitsHeader::default();
    let mut offset = 0usize;

    loop {
        let block = bytes.get(offset..offset + BLOCK_LEN).ok_or_else(|| {
            StarfinderError::InvalidFits("header ended before END card".to_string())
        })?;
        offset += BLOCK_LEN;

        for card in block.chunks_exact(CARD_LEN) {
            if card.starts_with(b"END") && card[3..].iter().all(|&b| b == b' ') {
                return Ok((header, offset));
            }
            if let Some((k, v)) = parse_header_card(card) {
                header.insert(k, v);
            }
        }
    }
}

fn parse_header_card(card: &[u8]) -> Option<(String, HeaderValue)> {
    let card_str = String::from_utf8_lossy(card);
    let keyword = card_str.get(..8)?.trim().to_string();
    if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
        return None;
    }
    if card_str.get(8..10) != Some("= ") {
        return None;
    }
    let value_str = card_str[10..].trim();
    let value = if let Some(quoted) = value_str.strip_prefix('\'') {
        // '' inside a string is an escaped quote
        let mut s = String::new();
        let mut chars = quoted.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    s.push('\'');
                } else {
                    break;
                }
            } else {
                s.push(ch);
            }
        }
        HeaderValue::Str(s.trim_end().to_string())
    } else {
        let num_part = match value_str.find('/') {
            Some(slash) => value_str[..slash].trim(),
            None => value_str,
        };
        match num_part {
            "T" => HeaderValue::Bool(true),
            "F" => HeaderValue::Bool(false),
            _ => {
                if let Ok(i) = num_part.parse::<i64>() {
                    HeaderValue::Int(i)
                } else if let Ok(f) = num_part.replace('D', "E").parse::<f64>() {
                    HeaderValue::Float(f)
                } else {
                    HeaderValue::Str(num_part.to_string())
                }
            }
        }
    };
    Some((keyword, value))
}
