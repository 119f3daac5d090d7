//! Upload authorization.
//!
//! The authorizer issues short-lived, owner-namespaced upload tickets after
//! checking the client's declared content type and size against the upload
//! contract. The checks here are scoping only: declarations are
//! client-asserted, so nothing downstream trusts them; the true bytes are
//! re-verified after upload. Rejecting here just fails fast, before any
//! bytes move.

use artel_core::config::IngestLimits;
use artel_core::constants::ALLOWED_CONTENT_TYPES;
use artel_core::models::{SourceFormat, UploadTicket};
use artel_storage::keys;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Ticket request rejections. All variants describe client-correctable
/// problems; infrastructure faults surface elsewhere.
#[derive(Debug, thiserror::Error)]
pub enum TicketRejection {
    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Declared size too large: {declared} bytes (max: {max} bytes)")]
    TooLarge { declared: u64, max: u64 },

    #[error("Declared size is zero")]
    EmptyDeclared,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
}

impl TicketRejection {
    /// Stable, user-actionable reason code for the wire.
    pub fn reason_code(&self) -> &'static str {
        match self {
            TicketRejection::UnsupportedContentType { .. } => "unsupported content type",
            TicketRejection::TooLarge { .. } => "file too large",
            TicketRejection::EmptyDeclared => "empty file",
            TicketRejection::InvalidFileName(_) => "invalid file name",
        }
    }
}

/// Issues upload tickets scoped to one object key.
pub struct UploadAuthorizer {
    limits: IngestLimits,
}

impl UploadAuthorizer {
    pub fn new(limits: IngestLimits) -> Self {
        Self { limits }
    }

    /// Issue a ticket for one upload, or reject the request.
    ///
    /// No storage or database write happens here; the only side effect is
    /// the ticket itself.
    pub fn issue_ticket(
        &self,
        owner_id: Uuid,
        declared_file_name: &str,
        declared_content_type: &str,
        declared_byte_size: u64,
    ) -> Result<UploadTicket, TicketRejection> {
        let safe_name = sanitize_file_name(declared_file_name)?;

        let format = SourceFormat::from_content_type(declared_content_type).ok_or_else(|| {
            TicketRejection::UnsupportedContentType {
                content_type: declared_content_type.to_string(),
                allowed: ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            }
        })?;

        if declared_byte_size == 0 {
            return Err(TicketRejection::EmptyDeclared);
        }
        if declared_byte_size > self.limits.max_upload_bytes {
            return Err(TicketRejection::TooLarge {
                declared: declared_byte_size,
                max: self.limits.max_upload_bytes,
            });
        }

        let issued_at = Utc::now();
        let ticket = UploadTicket {
            owner_id,
            object_key: keys::upload_key(owner_id, format),
            issued_at,
            expires_at: issued_at + Duration::seconds(self.limits.ticket_ttl_secs),
            allowed_content_types: ALLOWED_CONTENT_TYPES.iter().map(|s| s.to_string()).collect(),
            max_bytes: self.limits.max_upload_bytes,
        };

        tracing::debug!(
            owner_id = %owner_id,
            object_key = %ticket.object_key,
            file_name = %safe_name,
            content_type = %declared_content_type,
            declared_bytes = declared_byte_size,
            expires_at = %ticket.expires_at,
            "Upload ticket issued"
        );

        Ok(ticket)
    }
}

/// Sanitize a client-supplied file name. The name never reaches storage
/// (object keys are minted from uuids) but it does reach logs, and path
/// traversal attempts are rejected outright.
fn sanitize_file_name(file_name: &str) -> Result<String, TicketRejection> {
    const MAX_FILE_NAME_LENGTH: usize = 255;

    let base = std::path::Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    if base.contains("..") {
        return Err(TicketRejection::InvalidFileName(
            "file name contains path traversal".to_string(),
        ));
    }

    let sanitized: String = base
        .chars()
        .take(MAX_FILE_NAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}
