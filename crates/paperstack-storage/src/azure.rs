//! Azure Blob storage backend.

use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use paperstack_core::{Error, Result, StorageKind};

use crate::StorageBackend;

/// Azure Blob storage backend. Signed URLs are SAS tokens.
pub struct AzureBackend {
    store: MicrosoftAzure,
    container: String,
}

fn storage_err(op: &str, e: object_store::Error) -> Error {
    Error::Storage(format!("azure {}: {}", op, e))
}

impl AzureBackend {
    /// Build from environment credentials (`AZURE_STORAGE_ACCOUNT_NAME`,
    /// `AZURE_STORAGE_ACCOUNT_KEY`) plus an explicit container.
    pub fn from_env(container: &str) -> Result<Self> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| storage_err("build", e))?;
        Ok(Self {
            store,
            container: container.to_string(),
        })
    }

    /// Container this backend writes to.
    pub fn container(&self) -> &str {
        &self.container
    }
}

#[async_trait]
impl StorageBackend for AzureBackend {
    fn kind(&self) -> StorageKind {
        StorageKind::Azure
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        debug!(
            subsystem = "storage",
            component = "azure",
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
