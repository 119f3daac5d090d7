//! Compact perceptual placeholder codec.
//!
//! The placeholder is an 8x6 RGB grid of the source image, base64-encoded
//! into a fixed-length string that embeds directly in any payload. The
//! display side decodes the grid and re-expands it with a smoothing filter
//! into a blurred stand-in shown while the medium preview loads. The
//! contract is average-color fidelity, not edge fidelity: a decoded
//! placeholder must not clash with the final image.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// Placeholder grid width in pixels.
pub const GRID_WIDTH: u32 = 8;

/// Placeholder grid height in pixels.
pub const GRID_HEIGHT: u32 = 6;

const GRID_BYTES: usize = (GRID_WIDTH * GRID_HEIGHT * 3) as usize;

/// Length of every placeholder code. The grid byte count is divisible by
/// three, so base64 needs no padding and the length is exact.
pub const PLACEHOLDER_CODE_LEN: usize = GRID_BYTES / 3 * 4;

#[derive(Debug, thiserror::Error)]
pub enum PlaceholderError {
    #[error("Invalid placeholder encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid placeholder length: {len} bytes (expected: {expected})")]
    InvalidLength { len: usize, expected: usize },
}

/// Encode a decoded source image into its placeholder code.
///
/// Deterministic: the same pixels always produce the same code.
pub fn encode(img: &DynamicImage) -> String {
    let grid = img
        .resize_exact(GRID_WIDTH, GRID_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();
    STANDARD.encode(grid.as_raw())
}

/// Decode a placeholder code into a blurred preview of the given size.
pub fn decode(code: &str, width: u32, height: u32) -> Result<RgbImage, PlaceholderError> {
    let raw = STANDARD
        .decode(code)
        .map_err(|e| PlaceholderError::InvalidEncoding(e.to_string()))?;

    if raw.len() != GRID_BYTES {
        return Err(PlaceholderError::InvalidLength {
            len: raw.len(),
            expected: GRID_BYTES,
        });
    }

    let grid = RgbImage::from_raw(GRID_WIDTH, GRID_HEIGHT, raw)
        .ok_or_else(|| PlaceholderError::InvalidEncoding("grid buffer mismatch".to_string()))?;

    Ok(DynamicImage::ImageRgb8(grid)
        .resize_exact(width.max(1), height.max(1), FilterType::Triangle)
        .to_rgb8())
}
