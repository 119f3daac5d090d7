//! Contract constants for the ingestion pipeline.
//!
//! These are the default ceilings of the upload contract. Components take
//! their limits at construction, so tests can tighten them; these values are
//! what production configuration starts from.

/// Hard ceiling on uploaded file size: 50 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Hard ceiling on either image axis, in pixels.
pub const MAX_AXIS_PX: u32 = 8000;

/// Thumbnail edge length. Thumbnails are always exactly square.
pub const THUMBNAIL_EDGE_PX: u32 = 400;

/// Bound on the medium preview's long axis. Sources already within the
/// bound are never upscaled.
pub const MEDIUM_MAX_AXIS_PX: u32 = 1200;

/// Upload ticket lifetime in seconds.
pub const TICKET_TTL_SECS: i64 = 300;

/// Content types accepted at ticket issuance. The true byte-content format
/// is re-verified against the same set after upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/tiff"];
