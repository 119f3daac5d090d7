//! Derivative generation.
//!
//! Produces the full derivative set (thumbnail, medium preview, placeholder
//! code) from validated source bytes. The source is decoded exactly once and
//! all three transforms share the decoded pixels. Transforms are
//! deterministic: the same input bytes always produce the same outputs.
//!
//! Atomicity: any transform failure fails the whole call. Partial sets never
//! leave this module.

use crate::placeholder;
use artel_core::models::{ImageMetadata, SourceFormat};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// JPEG quality for thumbnails, tuned for dense grid display.
const THUMBNAIL_JPEG_QUALITY: u8 = 75;

/// JPEG quality for medium previews.
const MEDIUM_JPEG_QUALITY: u8 = 85;

/// WebP quality for medium previews.
const MEDIUM_WEBP_QUALITY: f32 = 80.0;

#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Encoding of one generated derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeFormat {
    Jpeg,
    Png,
    WebP,
}

impl DerivativeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DerivativeFormat::Jpeg => "jpg",
            DerivativeFormat::Png => "png",
            DerivativeFormat::WebP => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DerivativeFormat::Jpeg => "image/jpeg",
            DerivativeFormat::Png => "image/png",
            DerivativeFormat::WebP => "image/webp",
        }
    }

    /// Medium previews stay in the source's format family so transparency
    /// survives and photographic sources stay photographic. TIFF is not
    /// web-displayable, so its previews become JPEG.
    fn for_medium(source: SourceFormat) -> Self {
        match source {
            SourceFormat::Jpeg | SourceFormat::Tiff => DerivativeFormat::Jpeg,
            SourceFormat::Png => DerivativeFormat::Png,
            SourceFormat::WebP => DerivativeFormat::WebP,
        }
    }
}

/// One encoded derivative, not yet persisted.
#[derive(Debug, Clone)]
pub struct GeneratedAsset {
    pub bytes: Bytes,
    pub width_px: u32,
    pub height_px: u32,
    pub format: DerivativeFormat,
}

/// The complete generated set. Constructed only when all three transforms
/// succeeded.
#[derive(Debug, Clone)]
pub struct GeneratedSet {
    pub thumbnail: GeneratedAsset,
    pub medium_preview: GeneratedAsset,
    pub placeholder: String,
}

/// Generates the derivative set from validated source bytes.
pub struct DerivativeGenerator {
    thumbnail_edge_px: u32,
    medium_max_axis_px: u32,
}

impl DerivativeGenerator {
    pub fn new(thumbnail_edge_px: u32, medium_max_axis_px: u32) -> Self {
        Self {
            thumbnail_edge_px,
            medium_max_axis_px,
        }
    }

    /// Run all three transforms over a single decode of `bytes`.
    ///
    /// `metadata` must come from validation of these same bytes; dimensions
    /// are not re-derived here.
    pub fn generate(
        &self,
        bytes: &[u8],
        metadata: &ImageMetadata,
    ) -> Result<GeneratedSet, DeriveError> {
        let source_format = match metadata.format {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::WebP => ImageFormat::WebP,
            SourceFormat::Tiff => ImageFormat::Tiff,
        };

        let img = ImageReader::with_format(Cursor::new(bytes), source_format)
            .decode()
            .map_err(|e| DeriveError::Decode(e.to_string()))?;

        let thumbnail = self.thumbnail(&img)?;
        let medium_preview = self.medium_preview(&img, metadata.format)?;
        let placeholder = placeholder::encode(&img);

        tracing::debug!(
            source_width = metadata.width_px,
            source_height = metadata.height_px,
            thumbnail_bytes = thumbnail.bytes.len(),
            medium_width = medium_preview.width_px,
            medium_height = medium_preview.height_px,
            medium_bytes = medium_preview.bytes.len(),
            "Derivative set generated"
        );

        Ok(GeneratedSet {
            thumbnail,
            medium_preview,
            placeholder,
        })
    }

    /// Fixed-size square thumbnail: the longer axis is cropped symmetrically
    /// around center, never stretched, then the square is resized to the
    /// configured edge.
    fn thumbnail(&self, img: &DynamicImage) -> Result<GeneratedAsset, DeriveError> {
        let (width, height) = img.dimensions();
        let side = width.min(height);
        let x = (width - side) / 2;
        let y = (height - side) / 2;

        let square = img
            .crop_imm(x, y, side, side)
            .resize_exact(self.thumbnail_edge_px, self.thumbnail_edge_px, FilterType::Lanczos3);

        let bytes = encode_jpeg(&square, THUMBNAIL_JPEG_QUALITY, false)?;

        Ok(GeneratedAsset {
            bytes,
            width_px: self.thumbnail_edge_px,
            height_px: self.thumbnail_edge_px,
            format: DerivativeFormat::Jpeg,
        })
    }

    /// Medium preview: long axis bounded, aspect ratio preserved, never
    /// upscaled. Sources already within the bound are re-encoded at their
    /// original size.
    fn medium_preview(
        &self,
        img: &DynamicImage,
        source: SourceFormat,
    ) -> Result<GeneratedAsset, DeriveError> {
        let (width, height) = img.dimensions();
        let long_axis = width.max(height);

        let (target_width, target_height) = if long_axis > self.medium_max_axis_px {
            let bound = self.medium_max_axis_px as u64;
            if width >= height {
                let h = (height as u64 * bound + width as u64 / 2) / width as u64;
                (bound as u32, h.max(1) as u32)
            } else {
                let w = (width as u64 * bound + height as u64 / 2) / height as u64;
                (w.max(1) as u32, bound as u32)
            }
        } else {
            (width, height)
        };

        let resized;
        let preview = if (target_width, target_height) == (width, height) {
            img
        } else {
            resized = img.resize_exact(target_width, target_height, FilterType::Lanczos3);
            &resized
        };

        let format = DerivativeFormat::for_medium(source);
        let bytes = match format {
            // Progressive scan: the preview renders incrementally while it
            // streams.
            DerivativeFormat::Jpeg => encode_jpeg(preview, MEDIUM_JPEG_QUALITY, true)?,
            DerivativeFormat::Png => encode_png(preview)?,
            DerivativeFormat::WebP => encode_webp(preview, MEDIUM_WEBP_QUALITY)?,
        };

        Ok(GeneratedAsset {
            bytes,
            width_px: target_width,
            height_px: target_height,
            format,
        })
    }
}

/// Encode to JPEG via mozjpeg.
fn encode_jpeg(img: &DynamicImage, quality: u8, progressive: bool) -> Result<Bytes, DeriveError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    if progressive {
        comp.set_progressive_mode();
    }
    comp.set_optimize_coding(true);

    let mut comp = comp
        .start_compress(Vec::new())
        .map_err(|e| DeriveError::Encode(e.to_string()))?;
    comp.write_scanlines(&rgb_img)
        .map_err(|e| DeriveError::Encode(e.to_string()))?;
    let jpeg_data = comp
        .finish()
        .map_err(|e| DeriveError::Encode(e.to_string()))?;

    Ok(Bytes::from(jpeg_data))
}

/// Encode to PNG.
fn encode_png(img: &DynamicImage) -> Result<Bytes, DeriveError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| DeriveError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer))
}

/// Encode to WebP.
fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Bytes, DeriveError> {
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();

    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder.encode(quality);

    Ok(Bytes::copy_from_slice(&webp_data))
}
