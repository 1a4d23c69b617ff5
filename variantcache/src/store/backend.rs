//! Configured store selection.

use super::disk::DiskBlobStore;
use super::http::HttpBlobStore;
use super::memory::MemoryBlobStore;
use super::path::StorageKey;
use super::types::{BlobStore, StoreError};
use crate::http::AsyncReqwestClient;
use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Which store to build, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Process-local store, for development
    Memory,
    /// Local directory
    Disk { directory: PathBuf },
    /// S3-style HTTP object store
    Http {
        endpoint: String,
        bucket: String,
        token: Option<String>,
        timeout: Duration,
    },
}

impl StoreConfig {
    /// Short backend name as used in the config file.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Disk { .. } => "disk",
            Self::Http { .. } => "http",
        }
    }
}

/// Concrete blob store chosen at startup.
///
/// Enum dispatch keeps [`BlobStore`] free of `dyn` so its methods can stay
/// `async`.
pub enum StoreBackend {
    Memory(MemoryBlobStore),
    Disk(DiskBlobStore),
    Http(HttpBlobStore<AsyncReqwestClient>),
}

impl StoreBackend {
    /// Build the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the HTTP client cannot be built or
    /// the endpoint is invalid.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let backend = match config {
            StoreConfig::Memory => Self::Memory(MemoryBlobStore::new()),
            StoreConfig::Disk { directory } => Self::Disk(DiskBlobStore::new(directory.clone())),
            StoreConfig::Http {
                endpoint,
                bucket,
                token,
                timeout,
            } => {
                let client = AsyncReqwestClient::with_timeout(*timeout)
                    .map_err(|e| StoreError::Config(e.to_string()))?;
                let mut store = HttpBlobStore::new(client, endpoint, bucket)?;
                if let Some(token) = token {
                    store = store.with_token(token.clone());
                }
                Self::Http(store)
            }
        };
        info!(backend = config.kind(), "blob store configured");
        Ok(backend)
    }
}

impl BlobStore for StoreBackend {
    async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>, StoreError> {
        match self {
            Self::Memory(s) => s.get(key).await,
            Self::Disk(s) => s.get(key).await,
            Self::Http(s) => s.get(key).await,
        }
    }

    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.put(key, data).await,
            Self::Disk(s) => s.put(key, data).await,
            Self::Http(s) => s.put(key, data).await,
        }
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.delete(key).await,
            Self::Disk(s) => s.delete(key).await,
            Self::Http(s) => s.delete(key).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Memory(s) => s.name(),
            Self::Disk(s) => s.name(),
            Self::Http(s) => s.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_each_backend() {
        let memory = StoreBackend::from_config(&StoreConfig::Memory).unwrap();
        assert_eq!(memory.name(), "memory");

        let disk = StoreBackend::from_config(&StoreConfig::Disk {
            directory: PathBuf::from("/tmp/variantcache-test"),
        })
        .unwrap();
        assert_eq!(disk.name(), "disk");

        let http = StoreBackend::from_config(&StoreConfig::Http {
            endpoint: "http://localhost:9000".to_string(),
            bucket: "images".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(http.name(), "http");
    }

    #[test]
    fn test_bad_http_endpoint() {
        let result = StoreBackend::from_config(&StoreConfig::Http {
            endpoint: "::".to_string(),
            bucket: "images".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_dispatch_to_memory() {
        use crate::store::{FlatStrategy, PathStrategy};

        let store = StoreBackend::from_config(&StoreConfig::Memory).unwrap();
        let key = FlatStrategy.key_for("original", "a.jpg").unwrap();
        store.put(&key, Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from_static(b"x")));
    }
}
