//! Storage configuration from environment variables.

use tracing::{info, warn};

use paperstack_core::{Result, StorageKind};

use crate::{AzureBackend, FilesystemBackend, S3Backend, StorageRouter};

/// Default directory for the local backend.
pub const DEFAULT_LOCAL_PATH: &str = "data/uploads";

/// Storage configuration read from the environment.
///
/// | Variable | Meaning |
/// |----------|---------|
/// | `STORAGE_BACKEND` | `local` (default), `s3`, or `azure` |
/// | `STORAGE_LOCAL_PATH` | base directory for local blobs |
/// | `S3_BUCKET` | bucket name (required for s3) |
/// | `S3_ENDPOINT_URL` | custom endpoint (MinIO, R2) |
/// | `AZURE_CONTAINER` | container name (required for azure) |
///
/// AWS and Azure credentials come from their SDK-standard variables.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageKind,
    pub local_path: String,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub azure_container: Option<String>,
}

impl StorageConfig {
    /// Read configuration from the environment. An unknown
    /// `STORAGE_BACKEND` value falls back to local with a warning.
    pub fn from_env() -> Self {
        let backend = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageKind::S3,
            Ok("azure") => StorageKind::Azure,
            Ok("local") | Err(_) => StorageKind::Local,
            Ok(other) => {
                warn!(
                    subsystem = "storage",
                    requested = other,
                    "Unknown STORAGE_BACKEND, using local"
                );
                StorageKind::Local
            }
        };

        Self {
            backend,
            local_path: std::env::var("STORAGE_LOCAL_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_PATH.to_string()),
            s3_bucket: std::env::var("S3_BUCKET").ok(),
            s3_endpoint: std::env::var("S3_ENDPOINT_URL").ok(),
            azure_container: std::env::var("AZURE_CONTAINER").ok(),
        }
    }

    /// Build the router. A cloud backend that cannot be constructed
    /// (missing bucket/container or credentials) downgrades the active
    /// backend to local instead of failing startup.
    pub fn build(self) -> Result<StorageRouter> {
        let local = FilesystemBackend::new(&self.local_path);

        let s3 = match &self.s3_bucket {
            Some(bucket) => match S3Backend::from_env(bucket, self.s3_endpoint.as_deref()) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    warn!(subsystem = "storage", error = %e, "S3 backend unavailable");
                    None
                }
            },
            None => None,
        };

        let azure = match &self.azure_container {
            Some(container) => match AzureBackend::from_env(container) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    warn!(subsystem = "storage", error = %e, "Azure backend unavailable");
                    None
                }
            },
            None => None,
        };

        let active = match self.backend {
            StorageKind::S3 if s3.is_none() => {
                warn!(
                    subsystem = "storage",
                    "S3 requested but not configured, using local"
                );
                StorageKind::Local
            }
            StorageKind::Azure if azure.is_none() => {
                warn!(
                    subsystem = "storage",
                    "Azure requested but not configured, using local"
                );
                StorageKind::Local
            }
            kind => kind,
        };

        info!(
            subsystem = "storage",
            storage_backend = active.as_str(),
            local_path = %self.local_path,
            "Storage configured"
        );

        Ok(StorageRouter::new(active, local, s3, azure))
    }
}
