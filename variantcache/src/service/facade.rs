//! Service facade wiring every component from configuration.

use super::error::ServiceError;
use crate::config::{ConfigFile, KeyLayout};
use crate::http::AsyncReqwestClient;
use crate::log::Logger;
use crate::log_info;
use crate::origin::HttpOrigin;
use crate::pipeline::{CacheFillPipeline, FillError, FlushReport, PipelineStatsSnapshot};
use crate::store::{DirectoryStrategy, FlatStrategy, PathStrategy, StoreBackend};
use crate::variant::VariantCatalog;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Pipeline type assembled from configuration.
pub type ConfiguredPipeline = CacheFillPipeline<StoreBackend, HttpOrigin<AsyncReqwestClient>>;

/// Bytes plus the MIME type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Entry point for a front end: `get` and `flush` by variant name and
/// filename.
///
/// Cheap to clone; clones share one pipeline.
#[derive(Clone)]
pub struct CacheService {
    pipeline: Arc<ConfiguredPipeline>,
    catalog: Arc<VariantCatalog>,
}

impl CacheService {
    /// Build the catalog, key layout, store, origin and pipeline described
    /// by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the variant table is invalid, a required setting is
    /// missing, or an HTTP client cannot be created.
    pub fn from_config(config: &ConfigFile, logger: Arc<dyn Logger>) -> Result<Self, ServiceError> {
        let catalog = Arc::new(config.catalog()?);
        let store = StoreBackend::from_config(&config.store_config()?)?;

        let root_url = config.origin_root_url()?;
        let origin_client =
            AsyncReqwestClient::with_timeout(Duration::from_secs(config.origin.timeout))?;
        let origin = HttpOrigin::new(origin_client, &root_url)?;

        let paths: Arc<dyn PathStrategy> = match config.pipeline.key_layout {
            KeyLayout::Directory => Arc::new(DirectoryStrategy),
            KeyLayout::Flat => Arc::new(FlatStrategy),
        };

        log_info!(
            logger,
            "variantcache ready: {} variants, store {}, origin {}",
            catalog.len(),
            config.store.backend.as_str(),
            root_url
        );

        let pipeline = CacheFillPipeline::new(Arc::clone(&catalog), store, origin)
            .with_path_strategy(paths)
            .with_logger(logger)
            .with_coalescing(config.pipeline.coalesce);

        Ok(Self {
            pipeline: Arc::new(pipeline),
            catalog,
        })
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    /// Fetch `filename` in `variant`, filling the cache on a miss.
    pub async fn get(&self, variant: &str, filename: &str) -> Result<ServedImage, FillError> {
        let bytes = self.pipeline.get(variant, filename).await?;
        let content_type = content_type_for(&self.catalog, variant, &bytes);
        Ok(ServedImage {
            bytes,
            content_type,
        })
    }

    /// Invalidate cached forms of `filename`. Never fails.
    pub async fn flush(&self, variant: &str, filename: &str) -> FlushReport {
        self.pipeline.flush(variant, filename).await
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.pipeline.stats()
    }
}

/// MIME type for served bytes.
///
/// Derived variants use their configured encoding. Canonical bytes are
/// whatever the origin sent, so their format is sniffed.
pub fn content_type_for(catalog: &VariantCatalog, variant: &str, bytes: &[u8]) -> &'static str {
    match catalog.lookup(variant) {
        Ok(def) if !def.is_canonical() => def.encoding().mime_type(),
        _ => image::guess_format(bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream"),
    }
}
