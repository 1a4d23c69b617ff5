//! Blob storage for canonical images and variants.
//!
//! A [`PathStrategy`] maps `(variant, filename)` to a [`StorageKey`]; a
//! [`BlobStore`] reads, writes and deletes the bytes under that key.
//! Every write is accompanied by a [`ContentChecksum`] that the backing
//! store verifies.

mod backend;
mod checksum;
mod disk;
mod http;
mod memory;
mod path;
mod types;

pub use backend::{StoreBackend, StoreConfig};
pub use checksum::ContentChecksum;
pub use disk::DiskBlobStore;
pub use http::{HttpBlobStore, CHECKSUM_HEADER};
pub use memory::{MemoryBlobStore, StoreFault, StoreOpCounts};
pub use path::{
    validate_filename, DirectoryStrategy, FlatStrategy, PathError, PathStrategy, StorageKey,
};
pub use types::{BlobStore, StoreError};
