//! Shared key generation.
//!
//! Key format: source uploads live at `uploads/{owner_id}/{uuid}.{ext}`;
//! derivatives at the source stem plus a fixed per-kind suffix. Owner
//! namespacing prevents cross-tenant overwrite; the uuid prevents collision
//! between tickets; the fixed suffixes make source→derivative mapping
//! computable for cleanup and auditing.

use artel_core::models::{DerivativeKind, SourceFormat};
use uuid::Uuid;

/// Generate a fresh, owner-namespaced key for a source upload.
pub fn upload_key(owner_id: Uuid, format: SourceFormat) -> String {
    format!("uploads/{}/{}.{}", owner_id, Uuid::new_v4(), format.extension())
}

/// Compute the derivative key for a source key.
///
/// The source extension is replaced, not appended: thumbnails are always
/// JPEG, medium previews carry the extension of their own encoding.
pub fn derivative_key(source_key: &str, kind: DerivativeKind, extension: &str) -> String {
    let stem = match source_key.rfind('.') {
        // Guard against a '.' inside a directory segment rather than the
        // object name.
        Some(idx) if idx > source_key.rfind('/').map_or(0, |s| s + 1) => &source_key[..idx],
        _ => source_key,
    };
    format!("{}{}.{}", stem, kind.key_suffix(), extension)
}
