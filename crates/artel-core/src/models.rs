//! Domain models for the ingestion pipeline.
//!
//! Everything in this module crosses a component boundary: tickets issued to
//! clients, metadata handed between pipeline stages, and the terminal
//! `IngestionResult` consumed by the content-record layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// True image format, determined from byte content during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
}

impl SourceFormat {
    /// Map a declared MIME type to a format, if it is one we accept.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Parameters ("image/jpeg; charset=...") must not bypass the allowlist.
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "image/jpeg" | "image/jpg" => Some(SourceFormat::Jpeg),
            "image/png" => Some(SourceFormat::Png),
            "image/webp" => Some(SourceFormat::WebP),
            "image/tiff" => Some(SourceFormat::Tiff),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::WebP => "image/webp",
            SourceFormat::Tiff => "image/tiff",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::WebP => "webp",
            SourceFormat::Tiff => "tiff",
        }
    }
}

/// Kind of generated asset. Derivative object keys are computed from the
/// source key plus a fixed per-kind suffix, so the mapping needs no lookup
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeKind {
    Thumbnail,
    MediumPreview,
}

impl DerivativeKind {
    pub fn key_suffix(self) -> &'static str {
        match self {
            DerivativeKind::Thumbnail => "_thumb",
            DerivativeKind::MediumPreview => "_medium",
        }
    }
}

/// Short-lived, scope-limited permission to write one object to storage.
///
/// Issued by the authorizer, consumed by the client's direct upload. The
/// declared content types and byte ceiling scope the ticket only; the real
/// bytes are re-verified after upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTicket {
    pub owner_id: Uuid,
    pub object_key: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub allowed_content_types: Vec<String>,
    pub max_bytes: u64,
}

impl UploadTicket {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Metadata derived by inspecting raw image bytes. Immutable once computed;
/// the single source of truth for every later stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width_px: u32,
    pub height_px: u32,
    pub format: SourceFormat,
    pub byte_size: u64,
}

/// Locator and dimensions of one published derivative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub key: String,
    pub width_px: u32,
    pub height_px: u32,
    pub byte_size: u64,
}

/// The full set of derived assets for one source image. Constructed only as
/// a unit: partial sets never cross a component boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSet {
    pub thumbnail: AssetRef,
    pub medium_preview: AssetRef,
    pub placeholder: String,
}

/// Successful response to an upload request: where to PUT the bytes, which
/// key the attempt is tracked under, and how long the grant lasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub upload_url: String,
    pub object_key: String,
    pub expires_at: DateTime<Utc>,
}

/// Pipeline stage a failed attempt died in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    Validating,
    Generating,
    Publishing,
    Expired,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestStage::Validating => "validating",
            IngestStage::Generating => "generating",
            IngestStage::Publishing => "publishing",
            IngestStage::Expired => "expired",
        }
    }
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal, caller-visible outcome of one ingestion attempt. The only value
/// that crosses into the surrounding content-record layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestionResult {
    Complete {
        source_width: u32,
        source_height: u32,
        source_byte_size: u64,
        thumbnail: AssetRef,
        medium_preview: AssetRef,
        placeholder: String,
    },
    Failed {
        stage: IngestStage,
        reason: String,
    },
}

impl IngestionResult {
    pub fn complete(metadata: ImageMetadata, derivatives: DerivativeSet) -> Self {
        IngestionResult::Complete {
            source_width: metadata.width_px,
            source_height: metadata.height_px,
            source_byte_size: metadata.byte_size,
            thumbnail: derivatives.thumbnail,
            medium_preview: derivatives.medium_preview,
            placeholder: derivatives.placeholder,
        }
    }

    pub fn failed(stage: IngestStage, reason: impl Into<String>) -> Self {
        IngestionResult::Failed {
            stage,
            reason: reason.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, IngestionResult::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_source_format_from_content_type() {
        assert_eq!(
            SourceFormat::from_content_type("image/jpeg"),
            Some(SourceFormat::Jpeg)
        );
        assert_eq!(
            SourceFormat::from_content_type("IMAGE/PNG"),
            Some(SourceFormat::Png)
        );
        assert_eq!(
            SourceFormat::from_content_type("image/webp; charset=utf-8"),
            Some(SourceFormat::WebP)
        );
        assert_eq!(SourceFormat::from_content_type("application/pdf"), None);
        assert_eq!(SourceFormat::from_content_type("image/gif"), None);
    }

    #[test]
    fn test_ticket_expiry() {
        let issued = Utc::now();
        let ticket = UploadTicket {
            owner_id: Uuid::new_v4(),
            object_key: "uploads/x/y.jpg".to_string(),
            issued_at: issued,
            expires_at: issued + Duration::seconds(300),
            allowed_content_types: vec!["image/jpeg".to_string()],
            max_bytes: 1024,
        };

        assert!(!ticket.is_expired(issued + Duration::seconds(299)));
        assert!(ticket.is_expired(issued + Duration::seconds(300)));
        assert!(ticket.is_expired(issued + Duration::seconds(301)));
    }

    #[test]
    fn test_ingestion_result_serde_shape() {
        let failed = IngestionResult::failed(IngestStage::Validating, "unsupported format");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "validating");
        assert_eq!(json["reason"], "unsupported format");

        let complete = IngestionResult::complete(
            ImageMetadata {
                width_px: 3000,
                height_px: 2000,
                format: SourceFormat::Jpeg,
                byte_size: 4_000_000,
            },
            DerivativeSet {
                thumbnail: AssetRef {
                    key: "uploads/a/b_thumb.jpg".to_string(),
                    width_px: 400,
                    height_px: 400,
                    byte_size: 10,
                },
                medium_preview: AssetRef {
                    key: "uploads/a/b_medium.jpg".to_string(),
                    width_px: 1200,
                    height_px: 800,
                    byte_size: 20,
                },
                placeholder: "p".repeat(192),
            },
        );
        let json = serde_json::to_value(&complete).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["source_width"], 3000);
        assert_eq!(json["thumbnail"]["width_px"], 400);
    }
}
