//! Service configuration.
//!
//! Configuration is loaded from the environment once at startup and passed
//! into each component at construction. Components never read the
//! environment themselves, which keeps the pipeline testable in isolation
//! with fake storage and tightened limits.

use std::env;

use crate::constants;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
    /// In-process storage. Useful for tests and local demos only.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Ceilings enforced by the pipeline. Defaults come from [`constants`];
/// tests construct tighter values directly.
#[derive(Debug, Clone, Copy)]
pub struct IngestLimits {
    pub max_upload_bytes: u64,
    pub max_axis_px: u32,
    pub ticket_ttl_secs: i64,
}

impl Default for IngestLimits {
    fn default() -> Self {
        IngestLimits {
            max_upload_bytes: constants::MAX_UPLOAD_BYTES,
            max_axis_px: constants::MAX_AXIS_PX,
            ticket_ttl_secs: constants::TICKET_TTL_SECS,
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    // S3 settings
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub s3_endpoint: Option<String>,
    // Local filesystem settings
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub limits: IngestLimits,
}

impl ServiceConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = parse_env("SERVER_PORT", 3000u16)?;
        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let limits = IngestLimits {
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", constants::MAX_UPLOAD_BYTES)?,
            max_axis_px: parse_env("MAX_AXIS_PX", constants::MAX_AXIS_PX)?,
            ticket_ttl_secs: parse_env("TICKET_TTL_SECS", constants::TICKET_TTL_SECS)?,
        };

        Ok(ServiceConfig {
            server_port,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            limits,
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("s3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "LOCAL".parse::<StorageBackend>().unwrap(),
            StorageBackend::Local
        );
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_limits_match_contract() {
        let limits = IngestLimits::default();
        assert_eq!(limits.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(limits.max_axis_px, 8000);
        assert_eq!(limits.ticket_ttl_secs, 300);
    }
}
