//! In-memory blob store.

use super::checksum::ContentChecksum;
use super::path::StorageKey;
use super::types::{BlobStore, StoreError};
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use tracing::trace;

/// Operation counters for a [`MemoryBlobStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOpCounts {
    pub gets: u64,
    pub puts: u64,
    pub deletes: u64,
}

impl StoreOpCounts {
    pub fn total(&self) -> u64 {
        self.gets + self.puts + self.deletes
    }
}

/// Failure modes a [`MemoryBlobStore`] can be told to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// Every `get` fails with an I/O error
    GetFails,
    /// Every `put` fails with an I/O error
    PutFails,
    /// Every `delete` fails with an I/O error
    DeleteFails,
    /// `put` reports success but keeps only half the bytes
    TruncateOnWrite,
}

impl StoreFault {
    fn bit(self) -> u8 {
        match self {
            Self::GetFails => 1,
            Self::PutFails => 1 << 1,
            Self::DeleteFails => 1 << 2,
            Self::TruncateOnWrite => 1 << 3,
        }
    }
}

/// Blob store held entirely in process memory.
///
/// Useful for development and tests. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<StorageKey, Bytes>,
    faults: AtomicU8,
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` after checking it against `checksum`.
    ///
    /// This is the receiving side of an upload: the store recomputes the
    /// digest and refuses the write if it differs.
    pub fn put_verified(
        &self,
        key: &StorageKey,
        data: Bytes,
        checksum: ContentChecksum,
    ) -> Result<(), StoreError> {
        let actual = ContentChecksum::of(&data);
        if actual != checksum {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_string(),
                expected: checksum.to_hex(),
                actual: actual.to_hex(),
            });
        }
        self.blobs.insert(key.clone(), data);
        Ok(())
    }

    /// Start simulating `fault`.
    pub fn inject(&self, fault: StoreFault) {
        self.faults.fetch_or(fault.bit(), Ordering::SeqCst);
    }

    /// Stop simulating `fault`.
    pub fn clear(&self, fault: StoreFault) {
        self.faults.fetch_and(!fault.bit(), Ordering::SeqCst);
    }

    fn has_fault(&self, fault: StoreFault) -> bool {
        self.faults.load(Ordering::SeqCst) & fault.bit() != 0
    }

    fn injected_error(key: &StorageKey, op: &str) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            message: format!("injected {} failure", op),
        }
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        self.blobs.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<StorageKey> {
        let mut keys: Vec<StorageKey> = self.blobs.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn op_counts(&self) -> StoreOpCounts {
        StoreOpCounts {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>, StoreError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if self.has_fault(StoreFault::GetFails) {
            return Err(Self::injected_error(key, "get"));
        }
        let found = self.blobs.get(key).map(|entry| entry.value().clone());
        trace!(key = %key, hit = found.is_some(), "memory store get");
        Ok(found)
    }

    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        if self.has_fault(StoreFault::PutFails) {
            return Err(Self::injected_error(key, "put"));
        }
        let checksum = ContentChecksum::of(&data);
        trace!(key = %key, bytes = data.len(), checksum = %checksum, "memory store put");
        if self.has_fault(StoreFault::TruncateOnWrite) {
            self.blobs.insert(key.clone(), data.slice(..data.len() / 2));
            return Ok(());
        }
        self.put_verified(key, data, checksum)
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        if self.has_fault(StoreFault::DeleteFails) {
            return Err(Self::injected_error(key, "delete"));
        }
        self.blobs.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
