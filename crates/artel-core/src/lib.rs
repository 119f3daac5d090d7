//! Artel Core Library
//!
//! This crate provides the domain models, contract constants, and
//! configuration shared by all artel components.

pub mod config;
pub mod constants;
pub mod models;

// Re-export commonly used types
pub use config::{IngestLimits, ServiceConfig, StorageBackend};
pub use models::{
    AssetRef, DerivativeKind, DerivativeSet, ImageMetadata, IngestStage, IngestionReceipt,
    IngestionResult, SourceFormat, UploadTicket,
};
