//! S3-compatible object storage backend.

use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use paperstack_core::{Error, Result, StorageKind};

use crate::StorageBackend;

/// S3 (or S3-compatible, e.g. MinIO) storage backend.
pub struct S3Backend {
    store: AmazonS3,
    bucket: String,
}

fn storage_err(op: &str, e: object_store::Error) -> Error {
    Error::Storage(format!("s3 {}: {}", op, e))
}

impl S3Backend {
    /// Build from environment credentials (`AWS_ACCESS_KEY_ID`,
    /// `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`) plus an explicit bucket and
    /// optional custom endpoint.
    pub fn from_env(bucket: &str, endpoint: Option<&str>) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(endpoint) = endpoint {
            // Custom endpoints (MinIO, R2) are usually path-style.
            builder = builder
                .with_endpoint(endpoint)
                .with_virtual_hosted_style_request(false);
        }
        let store = builder.build().map_err(|e| storage_err("build", e))?;
        Ok(Self {
            store,
            bucket: bucket.to_string(),
        })
    }

    /// Bucket this backend writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn kind(&self) -> StorageKind {
        StorageKind::S3
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        debug!(
            subsystem = "storage",
            component = "s3",
            storage_path = path,
            size_bytes = data.len(),
            "Writing blob"
        );
        self.store
            .put(&ObjectPath::from(path), PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| storage_err("put", e))?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let result = self
            .store
            .get(&ObjectPath::from(path))
            .await
            .map_err(|e| storage_err("get", e))?;
        let bytes = result.bytes().await.map_err(|e| storage_err("get", e))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        match self.store.delete(&ObjectPath::from(path)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(storage_err("delete", e)),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.store.head(&ObjectPath::from(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(storage_err("head", e)),
        }
    }

    async fn signed_url(&self, path: &str, expires_secs: u64) -> Result<Option<String>> {
        let url = self
            .store
            .signed_url(
                Method::GET,
                &ObjectPath::from(path),
                Duration::from_secs(expires_secs),
            )
            .await
            .map_err(|e| storage_err("signed_url", e))?;
        Ok(Some(url.to_string()))
    }
}
