//! HTTP routes for the ingestion pipeline.
//!
//! Two operations cross this boundary: requesting an upload ticket and
//! completing an ingestion attempt. Completion outcomes, including failed
//! attempts, travel in the 200 body as the tagged `IngestionResult`,
//! because the caller's retry policy depends on the failed stage; transport
//! errors are reserved for infrastructure faults.

use crate::error::ApiError;
use crate::state::AppState;
use artel_core::models::{IngestionReceipt, IngestionResult};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Request bodies are small JSON control messages; image bytes never pass
/// through this service.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct RequestUploadBody {
    pub owner_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub byte_size: u64,
}

#[derive(Debug, Deserialize)]
pub struct CompleteIngestionBody {
    pub object_key: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/uploads", post(request_upload))
        .route("/uploads/complete", post(complete_ingestion))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn request_upload(
    State(state): State<AppState>,
    Json(body): Json<RequestUploadBody>,
) -> Result<(StatusCode, Json<IngestionReceipt>), ApiError> {
    let receipt = state
        .pipeline
        .request_upload(
            body.owner_id,
            &body.file_name,
            &body.content_type,
            body.byte_size,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn complete_ingestion(
    State(state): State<AppState>,
    Json(body): Json<CompleteIngestionBody>,
) -> Result<Json<IngestionResult>, ApiError> {
    let result = state.pipeline.complete_ingestion(&body.object_key).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use artel_core::config::IngestLimits;
    use artel_ingest::IngestionPipeline;
    use artel_storage::InMemoryStorage;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let storage = Arc::new(InMemoryStorage::new());
        let pipeline = Arc::new(IngestionPipeline::new(storage, IngestLimits::default()));
        router(AppState { pipeline })
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_upload_issues_ticket() {
        let body = serde_json::json!({
            "owner_id": Uuid::new_v4(),
            "file_name": "art.jpg",
            "content_type": "image/jpeg",
            "byte_size": 4_000_000,
        });
        let response = test_router()
            .oneshot(json_request("/uploads", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_request_upload_rejects_disallowed_type() {
        let body = serde_json::json!({
            "owner_id": Uuid::new_v4(),
            "file_name": "paper.pdf",
            "content_type": "application/pdf",
            "byte_size": 1000,
        });
        let response = test_router()
            .oneshot(json_request("/uploads", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_complete_unknown_key_is_not_found() {
        let body = serde_json::json!({ "object_key": "uploads/x/y.jpg" });
        let response = test_router()
            .oneshot(json_request("/uploads/complete", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
