//! Asset publishing.
//!
//! Persists a generated derivative set to storage under computed keys. The
//! two object writes are independent and order-insensitive, so they are
//! issued concurrently; on any failure the publisher best-effort deletes
//! whatever it already wrote and reports the whole call as failed. Callers
//! must not assume zero orphans after a failure, only that cleanup was
//! attempted.

use artel_core::models::{AssetRef, DerivativeKind, DerivativeSet};
use artel_processing::{GeneratedAsset, GeneratedSet};
use artel_storage::{keys, ObjectStorage, StorageError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Derivative write failed: {0}")]
    WriteFailed(#[from] StorageError),
}

/// Writes derivative sets to object storage.
pub struct AssetPublisher {
    storage: Arc<dyn ObjectStorage>,
}

impl AssetPublisher {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Publish both stored derivatives and assemble the caller-visible set.
    ///
    /// The placeholder travels inside the set itself and is never written
    /// to storage.
    pub async fn publish(
        &self,
        source_key: &str,
        generated: &GeneratedSet,
    ) -> Result<DerivativeSet, PublishError> {
        let thumb_key = keys::derivative_key(
            source_key,
            DerivativeKind::Thumbnail,
            generated.thumbnail.format.extension(),
        );
        let medium_key = keys::derivative_key(
            source_key,
            DerivativeKind::MediumPreview,
            generated.medium_preview.format.extension(),
        );

        let written = tokio::try_join!(
            self.write(&thumb_key, &generated.thumbnail),
            self.write(&medium_key, &generated.medium_preview),
        );

        if let Err(e) = written {
            tracing::warn!(
                source_key = %source_key,
                error = %e,
                "Derivative publish failed, attempting cleanup"
            );
            self.unpublish(&[&thumb_key, &medium_key]).await;
            return Err(PublishError::WriteFailed(e));
        }

        Ok(DerivativeSet {
            thumbnail: asset_ref(thumb_key, &generated.thumbnail),
            medium_preview: asset_ref(medium_key, &generated.medium_preview),
            placeholder: generated.placeholder.clone(),
        })
    }

    async fn write(&self, key: &str, asset: &GeneratedAsset) -> Result<(), StorageError> {
        self.storage
            .put(key, asset.bytes.clone(), asset.format.content_type())
            .await
    }

    /// Best-effort compensating cleanup. Delete failures are logged and
    /// swallowed; orphans remain eligible for external garbage collection
    /// through the computed key scheme.
    pub async fn unpublish(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Cleanup delete failed, object may be orphaned"
                );
            }
        }
    }
}

fn asset_ref(key: String, asset: &GeneratedAsset) -> AssetRef {
    AssetRef {
        key,
        width_px: asset.width_px,
        height_px: asset.height_px,
        byte_size: asset.bytes.len() as u64,
    }
}
