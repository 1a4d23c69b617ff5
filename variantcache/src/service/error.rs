//! Service construction errors.

use crate::config::ConfigFileError;
use crate::http::HttpError;
use crate::origin::OriginError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors building a [`super::CacheService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("origin error: {0}")]
    Origin(#[from] OriginError),
}
