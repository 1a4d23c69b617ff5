//! Content checksums attached to uploads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of a blob's bytes.
///
/// Computed by the caller before an upload and handed to the store
/// alongside the bytes, so the store can reject a payload that was damaged
/// in transit.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentChecksum([u8; 32]);

impl ContentChecksum {
    /// Hash `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Base64 form, as carried by the `x-amz-checksum-sha256` header.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns true if `data` hashes to this checksum.
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::of(data) == *self
    }
}

impl fmt::Debug for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentChecksum({})", self.to_hex())
    }
}

impl fmt::Display for ContentChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
