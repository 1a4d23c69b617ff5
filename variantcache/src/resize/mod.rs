//! Variant derivation from a canonical image.
//!
//! [`plan`] computes the geometry; [`Resizer`] decodes, scales, composes the
//! canvas and re-encodes. Both are deterministic: the same input and
//! variant always give byte-identical output.

mod plan;
mod resizer;

pub use plan::{plan, target_is_wider, Placement, Rect, ResizePlan};
pub use resizer::Resizer;

use crate::variant::VariantDefinition;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

/// Failures deriving a variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeError {
    /// Source bytes are not a decodable image
    #[error("failed to decode source image: {0}")]
    Decode(String),

    /// Re-encoding the canvas failed
    #[error("failed to encode variant: {0}")]
    Encode(String),

    /// Variant has zero dimensions and is served as-is
    #[error("variant '{0}' is a passthrough and is never resized")]
    Passthrough(String),

    /// Decoded image has no pixels
    #[error("source image has empty dimensions {width}x{height}")]
    EmptySource { width: u32, height: u32 },

    /// Scaled geometry does not fit in 32-bit dimensions
    #[error("scaled image of {width}x{height} is too large")]
    TooLarge { width: u64, height: u64 },
}

/// Derives variant bytes from canonical bytes.
///
/// Implementations are CPU-bound and are called from the blocking pool.
pub trait ImageResizer: Send + Sync {
    /// Produce the encoded image for `def` from `original`.
    ///
    /// # Errors
    ///
    /// Returns [`ResizeError::Decode`] if `original` is not an image and
    /// [`ResizeError::Encode`] if encoding the result fails.
    fn derive(&self, def: &VariantDefinition, original: &[u8]) -> Result<Bytes, ResizeError>;
}

impl<T: ImageResizer + ?Sized> ImageResizer for Arc<T> {
    fn derive(&self, def: &VariantDefinition, original: &[u8]) -> Result<Bytes, ResizeError> {
        (**self).derive(def, original)
    }
}
