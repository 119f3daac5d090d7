//! In-memory storage backend.
//!
//! Backs the pipeline's tests (and local demos) with a fake storage
//! namespace that counts every operation and can be told to fail writes or
//! deletes for matching keys. The counters let tests assert "zero storage
//! interaction" and "no double publish"; the fault hooks drive the partial
//! publish failure scenarios.

use crate::traits::{ObjectStorage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Snapshot of operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpCounts {
    pub puts: u64,
    pub gets: u64,
    pub deletes: u64,
    pub signed_urls: u64,
}

impl OpCounts {
    pub fn total(&self) -> u64 {
        self.puts + self.gets + self.deletes + self.signed_urls
    }
}

#[derive(Default)]
struct Faults {
    fail_put_matching: Option<String>,
    fail_delete_matching: Option<String>,
}

/// In-memory object storage with operation counters and fault injection.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    faults: Mutex<Faults>,
    puts: AtomicU64,
    gets: AtomicU64,
    deletes: AtomicU64,
    signed_urls: AtomicU64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent `put` whose key contains `fragment`.
    pub fn fail_puts_matching(&self, fragment: impl Into<String>) {
        self.faults.lock().unwrap().fail_put_matching = Some(fragment.into());
    }

    /// Fail every subsequent `delete` whose key contains `fragment`.
    pub fn fail_deletes_matching(&self, fragment: impl Into<String>) {
        self.faults.lock().unwrap().fail_delete_matching = Some(fragment.into());
    }

    /// Clear all injected faults.
    pub fn clear_faults(&self) {
        *self.faults.lock().unwrap() = Faults::default();
    }

    /// Current operation counters.
    pub fn op_counts(&self) -> OpCounts {
        OpCounts {
            puts: self.puts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
            signed_urls: self.signed_urls.load(Ordering::SeqCst),
        }
    }

    /// Number of objects currently stored.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// List stored keys, sorted. For test assertions.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        if let Some(ref fragment) = self.faults.lock().unwrap().fail_put_matching {
            if key.contains(fragment.as_str()) {
                return Err(StorageError::UploadFailed(format!(
                    "injected put fault for {}",
                    key
                )));
            }
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        if let Some(ref fragment) = self.faults.lock().unwrap().fail_delete_matching {
            if key.contains(fragment.as_str()) {
                return Err(StorageError::DeleteFailed(format!(
                    "injected delete fault for {}",
                    key
                )));
            }
        }

        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn signed_upload_url(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.signed_urls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{}?expires={}", key, expires_in.as_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete_roundtrip() {
        let storage = InMemoryStorage::new();
        let data = Bytes::from_static(b"abc");

        storage
            .put("uploads/o/k.jpg", data.clone(), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(storage.get("uploads/o/k.jpg").await.unwrap(), data);

        storage.delete("uploads/o/k.jpg").await.unwrap();
        assert!(matches!(
            storage.get("uploads/o/k.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_counters_track_operations() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.op_counts().total(), 0);

        storage
            .put("k", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        let _ = storage.get("k").await;
        let _ = storage.get("missing").await;
        storage.delete("k").await.unwrap();
        let _ = storage
            .signed_upload_url("k", "image/png", Duration::from_secs(60))
            .await;

        let counts = storage.op_counts();
        assert_eq!(counts.puts, 1);
        assert_eq!(counts.gets, 2);
        assert_eq!(counts.deletes, 1);
        assert_eq!(counts.signed_urls, 1);
    }

    #[tokio::test]
    async fn test_put_fault_injection() {
        let storage = InMemoryStorage::new();
        storage.fail_puts_matching("_medium");

        storage
            .put("a_thumb.jpg", Bytes::from_static(b"x"), "image/jpeg")
            .await
            .unwrap();
        let result = storage
            .put("a_medium.jpg", Bytes::from_static(b"y"), "image/jpeg")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));

        storage.clear_faults();
        assert!(storage
            .put("a_medium.jpg", Bytes::from_static(b"y"), "image/jpeg")
            .await
            .is_ok());
    }
}
