//! End-to-end pipeline tests against in-memory storage.
//!
//! The client's direct-to-storage upload is simulated by writing the bytes
//! at the ticketed key before calling completion, exactly as a real client
//! would PUT against its signed URL.

use artel_core::config::IngestLimits;
use artel_core::models::{IngestStage, IngestionResult};
use artel_ingest::{IngestError, IngestionPipeline};
use artel_storage::{InMemoryStorage, ObjectStorage};
use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn make_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 7 + y / 3) % 256) as u8])
    });
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, format).unwrap();
    buffer
}

/// A JPEG header declaring the given dimensions with no pixel data behind
/// it: the decompression-bomb shape.
fn jpeg_header_only(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    bytes
}

fn setup() -> (Arc<InMemoryStorage>, IngestionPipeline) {
    setup_with_limits(IngestLimits::default())
}

fn setup_with_limits(limits: IngestLimits) -> (Arc<InMemoryStorage>, IngestionPipeline) {
    let storage = Arc::new(InMemoryStorage::new());
    let pipeline = IngestionPipeline::new(storage.clone(), limits);
    (storage, pipeline)
}

async fn upload(
    storage: &InMemoryStorage,
    pipeline: &IngestionPipeline,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> String {
    let receipt = pipeline
        .request_upload(Uuid::new_v4(), file_name, content_type, bytes.len() as u64)
        .await
        .unwrap();
    storage
        .put(&receipt.object_key, Bytes::from(bytes), content_type)
        .await
        .unwrap();
    receipt.object_key
}

#[tokio::test]
async fn test_happy_path_jpeg() {
    let (storage, pipeline) = setup();
    let bytes = make_image(3000, 2000, ImageFormat::Jpeg);

    let receipt = pipeline
        .request_upload(Uuid::new_v4(), "artwork.jpg", "image/jpeg", 4_000_000)
        .await
        .unwrap();
    assert!(receipt.upload_url.contains(&receipt.object_key));

    storage
        .put(&receipt.object_key, Bytes::from(bytes), "image/jpeg")
        .await
        .unwrap();

    let result = pipeline
        .complete_ingestion(&receipt.object_key)
        .await
        .unwrap();

    match result {
        IngestionResult::Complete {
            source_width,
            source_height,
            thumbnail,
            medium_preview,
            placeholder,
            ..
        } => {
            assert_eq!(source_width, 3000);
            assert_eq!(source_height, 2000);
            assert_eq!((thumbnail.width_px, thumbnail.height_px), (400, 400));
            assert_eq!(
                (medium_preview.width_px, medium_preview.height_px),
                (1200, 800)
            );
            assert_eq!(placeholder.len(), artel_processing::PLACEHOLDER_CODE_LEN);

            // Derivatives are reachable under their computed keys.
            assert!(storage.exists(&thumbnail.key).await.unwrap());
            assert!(storage.exists(&medium_preview.key).await.unwrap());
            assert!(thumbnail.key.ends_with("_thumb.jpg"));
            assert!(medium_preview.key.ends_with("_medium.jpg"));
        }
        IngestionResult::Failed { stage, reason } => {
            panic!("expected success, failed at {} ({})", stage, reason)
        }
    }
}

#[tokio::test]
async fn test_scope_rejection_touches_no_storage() {
    let (storage, pipeline) = setup();

    let result = pipeline
        .request_upload(Uuid::new_v4(), "paper.pdf", "application/pdf", 1_000)
        .await;

    assert!(matches!(result, Err(IngestError::Rejected(_))));
    assert_eq!(storage.op_counts().total(), 0);
}

#[tokio::test]
async fn test_spoofed_content_type_fails_validation() {
    let (storage, pipeline) = setup();

    // A ticket was issued for image/jpeg, but the bytes are an executable
    // renamed to .jpg. Validation trusts the bytes, not the ticket.
    let key = upload(
        &storage,
        &pipeline,
        "innocent.jpg",
        "image/jpeg",
        b"MZ\x90\x00not actually an image".to_vec(),
    )
    .await;

    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert_eq!(
        result,
        IngestionResult::Failed {
            stage: IngestStage::Validating,
            reason: "unsupported format".to_string(),
        }
    );

    // No derivatives were produced; the only object is the source upload.
    assert_eq!(storage.keys(), vec![key]);
}

#[tokio::test]
async fn test_oversized_dimensions_rejected_without_decode() {
    let (storage, pipeline) = setup();

    let key = upload(
        &storage,
        &pipeline,
        "huge.jpg",
        "image/jpeg",
        jpeg_header_only(9000, 9000),
    )
    .await;

    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert_eq!(
        result,
        IngestionResult::Failed {
            stage: IngestStage::Validating,
            reason: "dimensions exceed limit".to_string(),
        }
    );
    assert_eq!(storage.keys(), vec![key]);
}

#[tokio::test]
async fn test_publish_fault_leaves_no_partial_set() {
    let (storage, pipeline) = setup();
    let key = upload(
        &storage,
        &pipeline,
        "art.jpg",
        "image/jpeg",
        make_image(600, 400, ImageFormat::Jpeg),
    )
    .await;

    storage.fail_puts_matching("_medium");

    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert!(matches!(
        result,
        IngestionResult::Failed {
            stage: IngestStage::Publishing,
            ..
        }
    ));

    // The thumbnail that may have been written before the fault is cleaned
    // up; no caller-visible partial set exists.
    assert_eq!(storage.keys(), vec![key.clone()]);

    // Publish faults are retriable in place: once storage recovers, the
    // same completion call succeeds against the untouched source bytes.
    storage.clear_faults();
    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_completion_is_idempotent() {
    let (storage, pipeline) = setup();
    let key = upload(
        &storage,
        &pipeline,
        "art.png",
        "image/png",
        make_image(500, 300, ImageFormat::Png),
    )
    .await;

    let first = pipeline.complete_ingestion(&key).await.unwrap();
    assert!(first.is_complete());

    let puts_after_first = storage.op_counts().puts;
    let keys_after_first = storage.keys();

    let second = pipeline.complete_ingestion(&key).await.unwrap();
    assert_eq!(first, second);

    // The replay published nothing: no new writes, no new keys.
    assert_eq!(storage.op_counts().puts, puts_after_first);
    assert_eq!(storage.keys(), keys_after_first);
}

#[tokio::test]
async fn test_expired_ticket_fails_and_stays_expired() {
    let (storage, pipeline) = setup_with_limits(IngestLimits {
        ticket_ttl_secs: 0,
        ..IngestLimits::default()
    });
    let key = upload(
        &storage,
        &pipeline,
        "late.jpg",
        "image/jpeg",
        make_image(100, 100, ImageFormat::Jpeg),
    )
    .await;

    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert!(matches!(
        result,
        IngestionResult::Failed {
            stage: IngestStage::Expired,
            ..
        }
    ));

    // Expired attempts are never retried in place.
    let again = pipeline.complete_ingestion(&key).await.unwrap();
    assert_eq!(result, again);
    assert_eq!(storage.keys(), vec![key]);
}

#[tokio::test]
async fn test_unknown_object_key() {
    let (_storage, pipeline) = setup();

    let result = pipeline.complete_ingestion("uploads/nobody/nothing.jpg").await;
    assert!(matches!(result, Err(IngestError::UnknownObjectKey(_))));
}

#[tokio::test]
async fn test_cancelled_attempt_is_retriable() {
    let (storage, pipeline) = setup();
    let key = upload(
        &storage,
        &pipeline,
        "art.jpg",
        "image/jpeg",
        make_image(200, 200, ImageFormat::Jpeg),
    )
    .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline
        .complete_ingestion_with_cancel(&key, cancel)
        .await
        .unwrap();
    assert!(matches!(result, IngestionResult::Failed { .. }));
    assert_eq!(storage.keys(), vec![key.clone()]);

    // The abandoned attempt can be completed normally afterwards.
    let result = pipeline.complete_ingestion(&key).await.unwrap();
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_completion_before_upload_is_retriable() {
    let (storage, pipeline) = setup();

    let receipt = pipeline
        .request_upload(Uuid::new_v4(), "eager.jpg", "image/jpeg", 1_000)
        .await
        .unwrap();

    // Client notifies before its upload landed.
    let result = pipeline
        .complete_ingestion(&receipt.object_key)
        .await
        .unwrap();
    assert_eq!(
        result,
        IngestionResult::Failed {
            stage: IngestStage::Validating,
            reason: "object not found in storage".to_string(),
        }
    );

    // Upload then retry: the same attempt completes.
    storage
        .put(
            &receipt.object_key,
            Bytes::from(make_image(150, 100, ImageFormat::Jpeg)),
            "image/jpeg",
        )
        .await
        .unwrap();
    let result = pipeline
        .complete_ingestion(&receipt.object_key)
        .await
        .unwrap();
    assert!(result.is_complete());
}

#[tokio::test]
async fn test_concurrent_attempts_for_different_keys() {
    let (storage, pipeline) = setup();
    let pipeline = Arc::new(pipeline);

    let mut keys = Vec::new();
    for i in 0..4u32 {
        let key = upload(
            &storage,
            &pipeline,
            &format!("art-{}.jpg", i),
            "image/jpeg",
            make_image(300 + i * 10, 200, ImageFormat::Jpeg),
        )
        .await;
        keys.push(key);
    }

    let mut handles = Vec::new();
    for key in &keys {
        let pipeline = pipeline.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            pipeline.complete_ingestion(&key).await.unwrap()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_complete());
    }

    // Each attempt published exactly its own two derivatives.
    assert_eq!(storage.object_count(), keys.len() * 3);
}
