//! VariantCache - a read-through cache of resized image variants.
//!
//! A request names a variant ("thumbnail", "crop", ...) and a filename.
//! The cache serves the stored bytes if present. Otherwise it makes sure
//! the untouched original is stored (fetching it from the origin if
//! needed), derives the variant from it, writes the result back, verifies
//! it and returns it.
//!
//! # High-Level API
//!
//! ```ignore
//! use variantcache::config::ConfigFile;
//! use variantcache::log::TracingLogger;
//! use variantcache::service::CacheService;
//! use std::sync::Arc;
//!
//! let config = ConfigFile::load()?;
//! let service = CacheService::from_config(&config, Arc::new(TracingLogger))?;
//!
//! let image = service.get("thumbnail", "shoes/red.jpg").await?;
//! service.flush("original", "shoes/red.jpg").await;
//! ```
//!
//! # Components
//!
//! - [`variant`] - variant definitions and the catalog
//! - [`store`] - storage keys and blob stores
//! - [`origin`] - upstream image source
//! - [`resize`] - variant derivation
//! - [`pipeline`] - the cache-fill state machine and flush

pub mod config;
pub mod http;
pub mod log;
pub mod logging;
pub mod origin;
pub mod pipeline;
pub mod resize;
pub mod service;
pub mod store;
pub mod variant;

/// Version of the library and CLI, shared across the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
