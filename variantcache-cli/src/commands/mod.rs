//! CLI command implementations.
//!
//! - [`get`] - Fetch a variant, filling the cache on a miss
//! - [`flush`] - Invalidate cached variants
//! - [`variants`] - List the variant table
//! - [`init`] - Write a default configuration file

pub mod flush;
pub mod get;
pub mod init;
pub mod variants;
