//! Artel Processing Library
//!
//! CPU-bound image work for the ingestion pipeline: byte-content validation
//! and derivative generation (thumbnail, medium preview, placeholder code).
//! Nothing in this crate performs I/O; callers decide how to schedule it
//! relative to their runtime.

pub mod derive;
pub mod placeholder;
pub mod validator;

// Re-export commonly used types
pub use derive::{DerivativeFormat, DerivativeGenerator, DeriveError, GeneratedAsset, GeneratedSet};
pub use placeholder::{PlaceholderError, PLACEHOLDER_CODE_LEN};
pub use validator::{ImageValidator, ValidationError};
