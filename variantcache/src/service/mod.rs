//! Configured cache service.

mod error;
mod facade;

pub use error::ServiceError;
pub use facade::{content_type_for, CacheService, ConfiguredPipeline, ServedImage};
