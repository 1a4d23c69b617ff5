//! Filesystem-backed blob store.

use super::checksum::ContentChecksum;
use super::path::StorageKey;
use super::types::{BlobStore, StoreError};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Directory under the root holding in-progress writes.
pub const STAGING_DIR: &str = ".staging";

/// Blob store rooted at a local directory.
///
/// Keys map to relative paths below the root. Writes go to a temporary file
/// under [`STAGING_DIR`] which is re-hashed against the upload checksum
/// before being renamed over the final path, so readers never observe a
/// partial blob. Storage keys never start with `.`, so staging files cannot
/// collide with a blob.
#[derive(Debug)]
pub struct DiskBlobStore {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a key.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    fn temp_path(&self) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.staging_dir()
            .join(format!("{}.{}.tmp", std::process::id(), n))
    }

    async fn write_checked(
        &self,
        key: &StorageKey,
        path: &Path,
        data: &[u8],
        checksum: ContentChecksum,
    ) -> Result<(), StoreError> {
        let temp = self.temp_path();
        tokio::fs::write(&temp, data)
            .await
            .map_err(|e| io_error(key, e))?;

        let written = tokio::fs::read(&temp).await.map_err(|e| io_error(key, e))?;
        let actual = ContentChecksum::of(&written);
        if actual != checksum {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::ChecksumMismatch {
                key: key.to_string(),
                expected: checksum.to_hex(),
                actual: actual.to_hex(),
            });
        }

        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(key, e));
        }
        Ok(())
    }
}

fn io_error(key: &StorageKey, e: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        message: e.to_string(),
    }
}

impl BlobStore for DiskBlobStore {
    async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => {
                trace!(key = %key, bytes = data.len(), "disk store hit");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }
        tokio::fs::create_dir_all(self.staging_dir())
            .await
            .map_err(|e| io_error(key, e))?;

        let checksum = ContentChecksum::of(&data);
        self.write_checked(key, &path, &data, checksum).await?;
        debug!(key = %key, bytes = data.len(), path = %path.display(), "disk store put");
        Ok(())
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn name(&self) -> &str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DirectoryStrategy, FlatStrategy, PathStrategy};
    use tempfile::TempDir;

    fn key(variant: &str, name: &str) -> StorageKey {
        DirectoryStrategy.key_for(variant, name).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_creates_directories() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        let k = key("thumbnail", "abcdefghij.jpg");

        store.put(&k, Bytes::from_static(b"jpeg")).await.unwrap();

        assert!(store.path_for(&k).exists());
        assert_eq!(
            store.get(&k).await.unwrap(),
            Some(Bytes::from_static(b"jpeg"))
        );
    }

    #[tokio::test]
    async fn test_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        assert_eq!(store.get(&key("original", "nothing.jpg")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        assert!(store.delete(&key("original", "nothing.jpg")).await.is_ok());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        let k = key("original", "a.jpg");

        store.put(&k, Bytes::from_static(b"first")).await.unwrap();
        store.put(&k, Bytes::from_static(b"second")).await.unwrap();

        assert_eq!(
            store.get(&k).await.unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        let parent = store.path_for(&k).parent().unwrap().to_path_buf();
        let entries: Vec<_> = std::fs::read_dir(parent).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let staged: Vec<_> = std::fs::read_dir(dir.path().join(STAGING_DIR))
            .unwrap()
            .collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn test_flat_keys_shaped_like_temp_names_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        let blob = FlatStrategy.key_for("original", "a.jpg").unwrap();
        let lookalike = FlatStrategy
            .key_for("original", &format!("a.jpg.{}.1.tmp", std::process::id()))
            .unwrap();

        store.put(&lookalike, Bytes::from_static(b"other")).await.unwrap();
        // Second write, staged with counter 1
        store.put(&blob, Bytes::from_static(b"mine")).await.unwrap();

        assert_eq!(
            store.get(&lookalike).await.unwrap(),
            Some(Bytes::from_static(b"other"))
        );
        assert_eq!(
            store.get(&blob).await.unwrap(),
            Some(Bytes::from_static(b"mine"))
        );
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = DiskBlobStore::new(dir.path());
        let k = key("original", "a.jpg");
        store.put(&k, Bytes::from_static(b"x")).await.unwrap();

        store.delete(&k).await.unwrap();

        assert!(!store.path_for(&k).exists());
    }

    #[test]
    fn test_path_for_nests_segments() {
        let store = DiskBlobStore::new("/var/cache");
        let path = store.path_for(&key("crop", "abcdefghij.jpg"));
        assert_eq!(path, PathBuf::from("/var/cache/crop/abcd/efgh/abcdefghij.jpg"));
    }
}
