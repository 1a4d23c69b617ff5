//! Failure taxonomy for cache fills.

use crate::origin::OriginError;
use crate::resize::ResizeError;
use crate::store::{PathError, StoreError};
use thiserror::Error;

/// How a failure should be presented to an HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The asset does not exist (or is not a supported variant)
    NotFound,
    /// The request itself is malformed
    ClientError,
    /// Infrastructure fault; the request may succeed later
    Unavailable,
}

impl FailureClass {
    pub fn http_status(&self) -> u16 {
        match self {
            FailureClass::NotFound => 404,
            FailureClass::ClientError => 400,
            FailureClass::Unavailable => 503,
        }
    }
}

/// Why a `get` could not produce bytes.
///
/// `Clone` so a single outcome can be handed to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(#[from] PathError),

    /// Absent at the origin and therefore not derivable
    #[error("not found: {filename} ({reason})")]
    NotFound { filename: String, reason: String },

    #[error("origin unavailable for {filename}: {message}")]
    UpstreamUnavailable { filename: String, message: String },

    /// Cache read failed for a reason other than a missing key
    #[error("store read failed: {0}")]
    StoreRead(StoreError),

    #[error("source image could not be decoded: {0}")]
    Decode(String),

    #[error("variant could not be encoded: {0}")]
    Encode(String),

    #[error("write to {key} failed: {source}")]
    StoreWriteFailed { key: String, source: StoreError },

    /// Store accepted the write but reading it back gave different bytes
    #[error("verification of {key} failed: {reason}")]
    StoreVerificationFailed { key: String, reason: String },
}

impl FillError {
    pub fn class(&self) -> FailureClass {
        match self {
            FillError::UnknownVariant(_) | FillError::NotFound { .. } => FailureClass::NotFound,
            FillError::InvalidFilename(_) => FailureClass::ClientError,
            _ => FailureClass::Unavailable,
        }
    }

    /// Status code for an HTTP front end: 404, 400 or 503.
    pub fn http_status(&self) -> u16 {
        self.class().http_status()
    }
}

impl From<OriginError> for FillError {
    fn from(e: OriginError) -> Self {
        match e {
            OriginError::NotFound { filename, reason } => FillError::NotFound { filename, reason },
            OriginError::UpstreamUnavailable { filename, message } => {
                FillError::UpstreamUnavailable { filename, message }
            }
            OriginError::Config(message) => FillError::UpstreamUnavailable {
                filename: String::new(),
                message,
            },
        }
    }
}

impl From<ResizeError> for FillError {
    fn from(e: ResizeError) -> Self {
        match e {
            ResizeError::Decode(_)
            | ResizeError::EmptySource { .. }
            | ResizeError::TooLarge { .. } => {
                FillError::Decode(e.to_string())
            }
            ResizeError::Encode(_) | ResizeError::Passthrough(_) => FillError::Encode(e.to_string()),
        }
    }
}
