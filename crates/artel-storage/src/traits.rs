//! Storage abstraction trait
//!
//! This module defines the contract the pipeline expects from object
//! storage: accept a write, return a retrievable object, delete on request,
//! and mint a time-boxed write grant for a single key.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object storage abstraction.
///
/// All backends (S3, local filesystem, in-memory) implement this trait, so
/// the pipeline composes against `Arc<dyn ObjectStorage>` and never couples
/// to a concrete backend.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write an object at the given key, overwriting any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Fetch an object by key. Missing objects are `StorageError::NotFound`,
    /// distinct from transport faults.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete an object by key. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Mint a time-boxed, write-scoped grant (a presigned PUT URL) for one
    /// key, so clients upload directly to storage without routing bytes
    /// through the service.
    async fn signed_upload_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
