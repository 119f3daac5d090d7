//! Image validation against untrusted bytes.
//!
//! The validator determines the true format from byte content (never from a
//! filename or declared content type), enforces size and dimension ceilings,
//! and confirms the decoder can parse a complete image. Dimensions are read
//! from the header before any full decode, so a tiny file declaring an
//! enormous pixel grid is rejected without allocating for it; the decode
//! itself runs under explicit allocation limits.

use artel_core::models::{ImageMetadata, SourceFormat};
use image::{ImageFormat, ImageReader, Limits};
use std::io::Cursor;

/// Image validation errors. `reason_code` is the stable wire form surfaced
/// to clients; the `Display` form carries the details for logs.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file")]
    Empty,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported format: {detected}")]
    UnsupportedFormat { detected: String },

    #[error("Dimensions exceed limit: {width}x{height} (max: {max} px per axis)")]
    DimensionsExceedLimit { width: u32, height: u32, max: u32 },

    #[error("Corrupt image: {0}")]
    Corrupt(String),
}

impl ValidationError {
    /// Stable, user-actionable reason code for the wire.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ValidationError::Empty => "empty file",
            ValidationError::TooLarge { .. } => "file too large",
            ValidationError::UnsupportedFormat { .. } => "unsupported format",
            ValidationError::DimensionsExceedLimit { .. } => "dimensions exceed limit",
            ValidationError::Corrupt(_) => "corrupt image",
        }
    }
}

/// Validates raw image bytes and derives [`ImageMetadata`].
///
/// Side-effect free and safe on adversarial input. The output metadata is
/// the single source of truth for every later pipeline stage.
pub struct ImageValidator {
    max_bytes: u64,
    max_axis_px: u32,
}

impl ImageValidator {
    pub fn new(max_bytes: u64, max_axis_px: u32) -> Self {
        Self {
            max_bytes,
            max_axis_px,
        }
    }

    /// Validate raw bytes, returning metadata on success.
    pub fn validate(&self, bytes: &[u8]) -> Result<ImageMetadata, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::Empty);
        }

        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        // True format from content. Unknown signatures and formats outside
        // the allowed set are rejected alike, before any decoding happens.
        let detected = image::guess_format(bytes).map_err(|_| {
            ValidationError::UnsupportedFormat {
                detected: "unknown".to_string(),
            }
        })?;
        let format = match detected {
            ImageFormat::Jpeg => SourceFormat::Jpeg,
            ImageFormat::Png => SourceFormat::Png,
            ImageFormat::WebP => SourceFormat::WebP,
            ImageFormat::Tiff => SourceFormat::Tiff,
            other => {
                return Err(ValidationError::UnsupportedFormat {
                    detected: format!("{:?}", other).to_lowercase(),
                })
            }
        };

        // Header-only dimension probe. This must run before the full decode
        // so declared-huge images fail on the cheap path.
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), detected)
            .into_dimensions()
            .map_err(|e| ValidationError::Corrupt(e.to_string()))?;

        if width > self.max_axis_px || height > self.max_axis_px {
            return Err(ValidationError::DimensionsExceedLimit {
                width,
                height,
                max: self.max_axis_px,
            });
        }
        if width == 0 || height == 0 {
            return Err(ValidationError::Corrupt("zero-sized image".to_string()));
        }

        // Full decode under explicit limits confirms the payload is a
        // complete, parseable image (catches truncation past the header).
        let mut reader = ImageReader::with_format(Cursor::new(bytes), detected);
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_axis_px);
        limits.max_image_height = Some(self.max_axis_px);
        reader.limits(limits);
        reader
            .decode()
            .map_err(|e| ValidationError::Corrupt(e.to_string()))?;

        Ok(ImageMetadata {
            width_px: width,
            height_px: height,
            format,
            byte_size: size,
        })
    }
}
