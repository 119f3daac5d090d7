//! HTTP error mapping.

use artel_ingest::IngestError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// Wrapper carrying ingestion errors out of handlers.
#[derive(Debug)]
pub struct ApiError(pub IngestError);

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self.0 {
            IngestError::Rejected(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "scope_rejected",
                rejection.to_string(),
            ),
            IngestError::UnknownObjectKey(key) => (
                StatusCode::NOT_FOUND,
                "unknown_object_key",
                format!("no ingestion attempt for key: {}", key),
            ),
            IngestError::InProgress(key) => (
                StatusCode::CONFLICT,
                "in_progress",
                format!("ingestion already running for key: {}", key),
            ),
            IngestError::Storage(e) => {
                tracing::error!(error = %e, "Storage fault surfaced to API");
                (
                    StatusCode::BAD_GATEWAY,
                    "storage_unavailable",
                    "object storage is temporarily unavailable".to_string(),
                )
            }
            IngestError::TaskJoin(e) => {
                tracing::error!(error = %e, "Processing task fault surfaced to API");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "processing failed, please try again".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
