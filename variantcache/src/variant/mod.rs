//! Variant definitions and the catalog that registers them.
//!
//! A variant is a named derivation policy (box size, scale mode, encoding,
//! quality). The catalog holds every variant the cache serves, exactly one of
//! which is canonical: the untouched upstream image all others derive from.

mod catalog;
mod types;

pub use catalog::{CatalogError, VariantCatalog, DEFAULT_CANONICAL_NAME};
pub use types::{FillColor, OutputEncoding, ScaleMode, VariantDefinition, PASSTHROUGH};
