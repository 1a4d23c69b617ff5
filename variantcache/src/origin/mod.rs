//! Upstream image source.
//!
//! The origin holds the untouched images. It is only consulted when the
//! canonical form of a file is missing from the blob store.

mod http;

pub use http::{classify_status, HttpOrigin, StatusClass};

use bytes::Bytes;
use std::future::Future;
use thiserror::Error;

/// Failures fetching from the origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    /// The origin does not have the asset (or reports it cannot serve it)
    #[error("image not found on origin: {filename} ({reason})")]
    NotFound { filename: String, reason: String },

    /// Transport failure or unexpected status
    #[error("origin unavailable for {filename}: {message}")]
    UpstreamUnavailable { filename: String, message: String },

    /// Origin client is misconfigured
    #[error("invalid origin configuration: {0}")]
    Config(String),
}

/// Fetches original image bytes by filename.
///
/// Implementations perform exactly one upstream request per call and never
/// retry.
pub trait OriginClient: Send + Sync {
    fn fetch(&self, filename: &str) -> impl Future<Output = Result<Bytes, OriginError>> + Send;

    /// Name for logging.
    fn name(&self) -> &str;
}
