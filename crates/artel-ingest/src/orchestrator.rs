//! Ingestion orchestration.
//!
//! One [`IngestionPipeline`] serves all ingestion attempts. Each attempt is
//! an independent workflow keyed by object key, tracked through
//! ticketed → awaiting-upload → validating → generating → publishing →
//! complete, with a terminal failure reachable from every non-terminal
//! state. Attempts for different keys share no mutable state beyond the
//! registry map itself and proceed fully in parallel.
//!
//! The orchestrator never retries internally: validation rejections and
//! expiry are terminal for the attempt, while generation and publish faults
//! return the attempt to awaiting-upload so the caller can retry in place
//! against the untouched source object while the ticket is fresh.

use crate::authorizer::{TicketRejection, UploadAuthorizer};
use crate::publisher::AssetPublisher;
use artel_core::config::IngestLimits;
use artel_core::constants::{MEDIUM_MAX_AXIS_PX, THUMBNAIL_EDGE_PX};
use artel_core::models::{
    IngestStage, IngestionReceipt, IngestionResult, UploadTicket,
};
use artel_processing::{DerivativeGenerator, ImageValidator};
use artel_storage::{ObjectStorage, StorageError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Infrastructure-level ingestion errors. Pipeline outcomes, including
/// failed attempts, are [`IngestionResult`] values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Rejected(#[from] TicketRejection),

    #[error("Unknown object key: {0}")]
    UnknownObjectKey(String),

    #[error("Ingestion already in progress for: {0}")]
    InProgress(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Processing task failed: {0}")]
    TaskJoin(String),
}

/// Registry entry for one attempt.
enum AttemptState {
    AwaitingUpload { ticket: UploadTicket },
    InFlight { ticket: UploadTicket },
    Terminal(IngestionResult),
}

/// How a finished attempt settles back into the registry.
enum Settled {
    /// Recorded and replayed verbatim on repeat completions.
    Terminal(IngestionResult),
    /// Reported to the caller, but the attempt returns to awaiting-upload
    /// so completion can be retried in place.
    Retriable(IngestionResult),
}

/// The ingestion pipeline facade: issues upload tickets and drives uploaded
/// objects through validation, generation, and publishing.
pub struct IngestionPipeline {
    storage: Arc<dyn ObjectStorage>,
    authorizer: UploadAuthorizer,
    validator: Arc<ImageValidator>,
    generator: Arc<DerivativeGenerator>,
    publisher: AssetPublisher,
    attempts: Mutex<HashMap<String, AttemptState>>,
}

impl IngestionPipeline {
    pub fn new(storage: Arc<dyn ObjectStorage>, limits: IngestLimits) -> Self {
        Self {
            authorizer: UploadAuthorizer::new(limits),
            validator: Arc::new(ImageValidator::new(
                limits.max_upload_bytes,
                limits.max_axis_px,
            )),
            generator: Arc::new(DerivativeGenerator::new(
                THUMBNAIL_EDGE_PX,
                MEDIUM_MAX_AXIS_PX,
            )),
            publisher: AssetPublisher::new(storage.clone()),
            storage,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Issue an upload ticket and register the attempt.
    ///
    /// Returns the signed upload target the client PUTs its bytes to. No
    /// object exists in storage until the client uploads.
    pub async fn request_upload(
        &self,
        owner_id: Uuid,
        file_name: &str,
        content_type: &str,
        byte_size: u64,
    ) -> Result<IngestionReceipt, IngestError> {
        let ticket = self
            .authorizer
            .issue_ticket(owner_id, file_name, content_type, byte_size)?;

        let ttl = (ticket.expires_at - ticket.issued_at)
            .to_std()
            .unwrap_or_default();
        let upload_url = self
            .storage
            .signed_upload_url(&ticket.object_key, content_type, ttl)
            .await?;

        let receipt = IngestionReceipt {
            upload_url,
            object_key: ticket.object_key.clone(),
            expires_at: ticket.expires_at,
        };

        tracing::info!(
            owner_id = %owner_id,
            object_key = %ticket.object_key,
            expires_at = %ticket.expires_at,
            "Ingestion attempt registered"
        );

        self.attempts
            .lock()
            .unwrap()
            .insert(ticket.object_key.clone(), AttemptState::AwaitingUpload { ticket });

        Ok(receipt)
    }

    /// The client's "object is in place" notification.
    pub async fn complete_ingestion(&self, object_key: &str) -> Result<IngestionResult, IngestError> {
        self.complete_ingestion_with_cancel(object_key, CancellationToken::new())
            .await
    }

    /// [`complete_ingestion`](Self::complete_ingestion), observing a
    /// cancellation token between stages. A cancelled attempt still runs
    /// compensating cleanup for anything it already published.
    pub async fn complete_ingestion_with_cancel(
        &self,
        object_key: &str,
        cancel: CancellationToken,
    ) -> Result<IngestionResult, IngestError> {
        // Claim the attempt. Repeat completions of a finished attempt
        // replay the recorded result; concurrent completions are refused.
        let ticket = {
            let mut attempts = self.attempts.lock().unwrap();
            let claimed = match attempts.get(object_key) {
                None => return Err(IngestError::UnknownObjectKey(object_key.to_string())),
                Some(AttemptState::Terminal(result)) => return Ok(result.clone()),
                Some(AttemptState::InFlight { .. }) => {
                    return Err(IngestError::InProgress(object_key.to_string()))
                }
                Some(AttemptState::AwaitingUpload { ticket }) => ticket.clone(),
            };
            attempts.insert(
                object_key.to_string(),
                AttemptState::InFlight {
                    ticket: claimed.clone(),
                },
            );
            claimed
        };

        match self.run_attempt(&ticket, &cancel).await {
            Ok(settled) => Ok(self.settle(object_key, settled)),
            Err(e) => {
                // Infrastructure fault: hand the attempt back for retry.
                self.reset_to_awaiting(object_key);
                Err(e)
            }
        }
    }

    /// Drive one claimed attempt through validate → generate → publish.
    async fn run_attempt(
        &self,
        ticket: &UploadTicket,
        cancel: &CancellationToken,
    ) -> Result<Settled, IngestError> {
        let object_key = ticket.object_key.as_str();

        if let Some(settled) = stage_guard(ticket, cancel, IngestStage::Validating) {
            return Ok(settled);
        }

        // Re-fetch by key. The upload happened directly between client and
        // storage; a client-supplied payload is never trusted here.
        let bytes = match self.storage.get(object_key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(object_key, "Completion notified but object not in storage");
                return Ok(Settled::Retriable(IngestionResult::failed(
                    IngestStage::Validating,
                    "object not found in storage",
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let validator = self.validator.clone();
        let validate_input = bytes.clone();
        let validation = tokio::task::spawn_blocking(move || validator.validate(&validate_input))
            .await
            .map_err(|e| IngestError::TaskJoin(e.to_string()))?;

        let metadata = match validation {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(object_key, error = %e, "Upload rejected by validation");
                return Ok(Settled::Terminal(IngestionResult::failed(
                    IngestStage::Validating,
                    e.reason_code(),
                )));
            }
        };

        if let Some(settled) = stage_guard(ticket, cancel, IngestStage::Generating) {
            return Ok(settled);
        }

        let generator = self.generator.clone();
        let generate_input = bytes.clone();
        let generated =
            tokio::task::spawn_blocking(move || generator.generate(&generate_input, &metadata))
                .await
                .map_err(|e| IngestError::TaskJoin(e.to_string()))?;

        let generated = match generated {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(object_key, error = %e, "Derivative generation failed");
                return Ok(Settled::Retriable(IngestionResult::failed(
                    IngestStage::Generating,
                    "derivative generation failed",
                )));
            }
        };

        if let Some(settled) = stage_guard(ticket, cancel, IngestStage::Publishing) {
            return Ok(settled);
        }

        let derivatives = match self.publisher.publish(object_key, &generated).await {
            Ok(derivatives) => derivatives,
            Err(e) => {
                tracing::error!(object_key, error = %e, "Derivative publish failed");
                return Ok(Settled::Retriable(IngestionResult::failed(
                    IngestStage::Publishing,
                    "derivative publish failed",
                )));
            }
        };

        // An attempt that outlived its ticket (or was abandoned) during
        // publishing must not surface success; published objects become
        // cleanup candidates.
        if let Some(settled) = stage_guard(ticket, cancel, IngestStage::Publishing) {
            self.publisher
                .unpublish(&[&derivatives.thumbnail.key, &derivatives.medium_preview.key])
                .await;
            return Ok(settled);
        }

        tracing::info!(
            object_key,
            source_width = metadata.width_px,
            source_height = metadata.height_px,
            thumbnail_key = %derivatives.thumbnail.key,
            medium_key = %derivatives.medium_preview.key,
            "Ingestion complete"
        );

        Ok(Settled::Terminal(IngestionResult::complete(
            metadata,
            derivatives,
        )))
    }

    fn settle(&self, object_key: &str, settled: Settled) -> IngestionResult {
        let mut attempts = self.attempts.lock().unwrap();
        match settled {
            Settled::Terminal(result) => {
                attempts.insert(object_key.to_string(), AttemptState::Terminal(result.clone()));
                result
            }
            Settled::Retriable(result) => {
                if let Some(AttemptState::InFlight { ticket }) = attempts.remove(object_key) {
                    attempts.insert(
                        object_key.to_string(),
                        AttemptState::AwaitingUpload { ticket },
                    );
                }
                result
            }
        }
    }

    fn reset_to_awaiting(&self, object_key: &str) {
        let mut attempts = self.attempts.lock().unwrap();
        if let Some(AttemptState::InFlight { ticket }) = attempts.remove(object_key) {
            attempts.insert(
                object_key.to_string(),
                AttemptState::AwaitingUpload { ticket },
            );
        }
    }
}

/// Stage-boundary check: expiry ends the attempt for good, cancellation
/// abandons it retriably.
fn stage_guard(
    ticket: &UploadTicket,
    cancel: &CancellationToken,
    stage: IngestStage,
) -> Option<Settled> {
    if ticket.is_expired(Utc::now()) {
        return Some(Settled::Terminal(IngestionResult::failed(
            IngestStage::Expired,
            "ticket expired",
        )));
    }
    if cancel.is_cancelled() {
        return Some(Settled::Retriable(IngestionResult::failed(
            stage,
            "cancelled by caller",
        )));
    }
    None
}
