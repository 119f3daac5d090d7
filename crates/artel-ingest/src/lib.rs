//! Artel Ingest Library
//!
//! The content ingestion pipeline: upload authorization, asset publishing,
//! and the orchestrator that sequences ticket → upload → validate →
//! generate → publish into one auditable state machine per attempt.

pub mod authorizer;
pub mod orchestrator;
pub mod publisher;

// Re-export commonly used types
pub use authorizer::{TicketRejection, UploadAuthorizer};
pub use orchestrator::{IngestError, IngestionPipeline};
pub use publisher::{AssetPublisher, PublishError};
