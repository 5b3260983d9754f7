//! # paperstack-storage
//!
//! Pluggable blob storage for uploaded documents.
//!
//! Three backends implement [`StorageBackend`]: local filesystem (atomic
//! temp-file writes), S3-compatible object storage, and Azure Blob. Which
//! backend receives new uploads is chosen by configuration; every document
//! records the backend that holds its bytes, so reads keep working after
//! the active backend changes.
//!
//! Cloud backends can mint time-limited signed URLs for direct client
//! downloads; the local backend returns `None` and the API serves bytes
//! itself.

pub mod azure;
pub mod config;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use paperstack_core::{Error, Result, StorageKind};

pub use azure::AzureBackend;
pub use config::StorageConfig;
pub use local::FilesystemBackend;
pub use s3::S3Backend;

/// Storage backend trait for different blob store implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which backend kind this is, recorded on each stored document.
    fn kind(&self) -> StorageKind;

    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Time-limited URL a client can fetch the blob from directly.
    ///
    /// `None` means the backend has no URL scheme (local filesystem) and
    /// the caller must serve the bytes itself.
    async fn signed_url(&self, path: &str, expires_secs: u64) -> Result<Option<String>>;
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Object path for a document blob: `documents/{uuid}{ext}`.
///
/// The extension is kept so cloud consoles and signed-URL downloads show
/// a sensible file type.
pub fn document_path(id: Uuid, extension: &str) -> String {
    format!("documents/{}{}", id, extension)
}

/// Routes operations to the configured backends.
///
/// New uploads go to the active backend, falling back to local when a
/// cloud write fails. Reads and deletes are routed by the backend kind
/// recorded on the document.
pub struct StorageRouter {
    active: StorageKind,
    local: FilesystemBackend,
    s3: Option<S3Backend>,
    azure: Option<AzureBackend>,
}

impl StorageRouter {
    pub fn new(
        active: StorageKind,
        local: FilesystemBackend,
        s3: Option<S3Backend>,
        azure: Option<AzureBackend>,
    ) -> Self {
        Self {
            active,
            local,
            s3,
            azure,
        }
    }

    /// Backend kind that receives new uploads.
    pub fn active_kind(&self) -> StorageKind {
        self.active
    }

    /// Startup round-trip check of the local backend.
    ///
    /// Local is always configured and is the fallback for cloud write
    /// failures, so an unwritable base directory should fail boot rather
    /// than the first upload.
    pub async fn validate(&self) -> Result<()> {
        self.local
            .validate()
            .await
            .map_err(|e| Error::Storage(format!("local storage validation failed: {}", e)))
    }

    /// Resolve the backend holding a document's bytes.
    pub fn backend(&self, kind: StorageKind) -> Result<&dyn StorageBackend> {
        match kind {
            StorageKind::Local => Ok(&self.local),
            StorageKind::S3 => self
                .s3
                .as_ref()
                .map(|b| b as &dyn StorageBackend)
                .ok_or_else(|| Error::Storage("S3 backend is not configured".to_string())),
            StorageKind::Azure => self
                .azure
                .as_ref()
                .map(|b| b as &dyn StorageBackend)
                .ok_or_else(|| Error::Storage("Azure backend is not configured".to_string())),
        }
    }

    /// Store a new blob on the active backend, falling back to local when
    /// a cloud write fails. Returns the kind that actually holds the data.
    pub async fn store(&self, path: &str, data: &[u8]) -> Result<StorageKind> {
        let backend = self.backend(self.active)?;
        match backend.write(path, data).await {
            Ok(()) => Ok(self.active),
            Err(e) if self.active != StorageKind::Local => {
                warn!(
                    subsystem = "storage",
                    storage_backend = self.active.as_str(),
                    storage_path = path,
                    error = %e,
                    "Cloud write failed, falling back to local storage"
                );
                self.local.write(path, data).await?;
                Ok(StorageKind::Local)
            }
            Err(e) => Err(e),
        }
    }

    /// Read a blob from the backend that holds it.
    pub async fn read(&self, kind: StorageKind, path: &str) -> Result<Vec<u8>> {
        self.backend(kind)?.read(path).await
    }

    /// Delete a blob from the backend that holds it.
    pub async fn delete(&self, kind: StorageKind, path: &str) -> Result<()> {
        self.backend(kind)?.delete(path).await
    }

    /// Signed URL for a blob, `None` on the local backend.
    pub async fn signed_url(
        &self,
        kind: StorageKind,
        path: &str,
        expires_secs: u64,
    ) -> Result<Option<String>> {
        self.backend(kind)?.signed_url(path, expires_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_format() {
        let hash = compute_content_hash(b"hello world");
        assert!(hash.starts_with("blake3:"));
        assert_eq!(hash.len(), "blake3:".len() + 64);
    }

    #[test]
    fn test_content_hash_deterministic() {
        assert_eq!(compute_content_hash(b"abc"), compute_content_hash(b"abc"));
        assert_ne!(compute_content_hash(b"abc"), compute_content_hash(b"abd"));
    }

    #[tokio::test]
    async fn test_router_validate_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let router = StorageRouter::new(
            StorageKind::Local,
            FilesystemBackend::new(dir.path()),
            None,
            None,
        );
        router.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_router_validate_rejects_unwritable_base() {
        // Base path is a regular file, so the check directory cannot be
        // created
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"x").unwrap();
        let router = StorageRouter::new(
            StorageKind::Local,
            FilesystemBackend::new(&blocker),
            None,
            None,
        );
        assert!(router.validate().await.is_err());
    }

    #[test]
    fn test_document_path() {
        let id = Uuid::now_v7();
        assert_eq!(
            document_path(id, ".pdf"),
            format!("documents/{}.pdf", id)
        );
        assert_eq!(document_path(id, ""), format!("documents/{}", id));
    }
}
