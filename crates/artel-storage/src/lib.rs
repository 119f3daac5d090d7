//! Artel Storage Library
//!
//! Object-storage abstraction for the ingestion pipeline: the
//! [`ObjectStorage`] trait plus S3, local filesystem, and in-memory
//! backends.
//!
//! # Key format
//!
//! Keys are owner-scoped and collision-free by construction:
//!
//! - **Source uploads**: `uploads/{owner_id}/{uuid}.{ext}`
//! - **Derivatives**: the source key stem plus a fixed per-kind suffix,
//!   e.g. `uploads/{owner_id}/{uuid}_thumb.jpg`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is
//! centralized in the `keys` module so every backend and the publisher stay
//! consistent, and so derivative keys stay computable without a lookup
//! table.

pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use memory::{InMemoryStorage, OpCounts};
pub use s3::S3Storage;
pub use traits::{ObjectStorage, StorageError, StorageResult};
