//! Blob store trait and error type.

use super::path::StorageKey;
use bytes::Bytes;
use std::future::Future;
use thiserror::Error;

/// Failures talking to a blob store.
///
/// A missing key is not an error: `get` returns `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Local I/O failure
    #[error("store I/O error for {key}: {message}")]
    Io { key: String, message: String },

    /// The store rejected an upload whose bytes did not match the checksum
    #[error("checksum mismatch for {key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    /// Remote store answered with an unexpected status
    #[error("store returned HTTP {status} for {key}")]
    Status { key: String, status: u16 },

    /// Remote store could not be reached
    #[error("store transport error for {key}: {message}")]
    Transport { key: String, message: String },

    /// Store is misconfigured (bad endpoint, missing bucket, ...)
    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Object-store capability keyed by [`StorageKey`].
///
/// Implementations must compute a [`ContentChecksum`](super::ContentChecksum)
/// of every uploaded payload and have the backing store verify it.
pub trait BlobStore: Send + Sync {
    /// Read a blob. Returns `Ok(None)` when the key does not exist.
    fn get(&self, key: &StorageKey) -> impl Future<Output = Result<Option<Bytes>, StoreError>> + Send;

    /// Write a blob, replacing any previous content.
    fn put(&self, key: &StorageKey, data: Bytes) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a blob. Deleting a missing key succeeds.
    fn delete(&self, key: &StorageKey) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
