//! Cache-fill pipeline.
//!
//! Per request:
//!
//! ```text
//! CHECK_VARIANT ─► CHECK_CACHE ─┬─ hit ─► RETURN
//!                               └─ miss ─► OBTAIN_SOURCE ─► DERIVE ─► WRITE_BACK ─► VERIFY ─► RETURN
//! ```
//!
//! For the canonical variant the source is the origin and derivation is the
//! identity. For any other variant the source is the canonical image,
//! obtained by running the canonical fill first, so the canonical image is
//! always cached before a variant is built from it. That inner fill never
//! recurses further.

mod coalesce;
mod error;
mod stats;

pub use coalesce::{CoalescerStats, FillResult, RequestCoalescer};
pub use error::{FailureClass, FillError};
pub use stats::{PipelineStats, PipelineStatsSnapshot};

use crate::log::{Logger, TracingLogger};
use crate::origin::OriginClient;
use crate::resize::{ImageResizer, Resizer};
use crate::store::{BlobStore, DirectoryStrategy, PathStrategy, StorageKey};
use crate::variant::{VariantCatalog, VariantDefinition};
use crate::{log_debug, log_error, log_warn};
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of a flush. Flushing never fails; problems are reported to the
/// diagnostic sink and summarised here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Keys whose delete succeeded (including keys that did not exist)
    pub removed: Vec<StorageKey>,
    /// Keys whose delete failed
    pub failed: Vec<StorageKey>,
    /// Set when the request was rejected before any I/O
    pub rejected: Option<String>,
}

impl FlushReport {
    fn rejected(reason: String) -> Self {
        Self {
            rejected: Some(reason),
            ..Self::default()
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// True if every targeted key was deleted.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_none()
    }
}

/// Serves variants from a blob store, filling misses from the origin.
///
/// # Example
///
/// ```
/// use variantcache::pipeline::CacheFillPipeline;
/// use variantcache::store::MemoryBlobStore;
/// use variantcache::variant::VariantCatalog;
/// use variantcache::origin::{OriginClient, OriginError};
/// use bytes::Bytes;
/// use std::sync::Arc;
///
/// struct NoOrigin;
///
/// impl OriginClient for NoOrigin {
///     async fn fetch(&self, filename: &str) -> Result<Bytes, OriginError> {
///         Err(OriginError::NotFound { filename: filename.into(), reason: "empty".into() })
///     }
///     fn name(&self) -> &str { "none" }
/// }
///
/// let pipeline = CacheFillPipeline::new(
///     Arc::new(VariantCatalog::builtin()),
///     MemoryBlobStore::new(),
///     NoOrigin,
/// );
/// assert!(pipeline.catalog().supports("thumbnail"));
/// ```
pub struct CacheFillPipeline<S, O, R = Resizer> {
    catalog: Arc<VariantCatalog>,
    paths: Arc<dyn PathStrategy>,
    store: S,
    origin: O,
    resizer: Arc<R>,
    logger: Arc<dyn Logger>,
    coalescer: Option<RequestCoalescer>,
    stats: PipelineStats,
}

impl<S, O> CacheFillPipeline<S, O, Resizer>
where
    S: BlobStore,
    O: OriginClient,
{
    /// Pipeline with the directory key layout, the default resizer,
    /// tracing diagnostics and coalescing enabled.
    pub fn new(catalog: Arc<VariantCatalog>, store: S, origin: O) -> Self {
        Self {
            catalog,
            paths: Arc::new(DirectoryStrategy),
            store,
            origin,
            resizer: Arc::new(Resizer::new()),
            logger: Arc::new(TracingLogger),
            coalescer: Some(RequestCoalescer::new()),
            stats: PipelineStats::default(),
        }
    }
}

impl<S, O, R> CacheFillPipeline<S, O, R>
where
    S: BlobStore,
    O: OriginClient,
    R: ImageResizer + 'static,
{
    pub fn with_path_strategy(mut self, paths: Arc<dyn PathStrategy>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Enable or disable per-key single flight.
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalescer = enabled.then(RequestCoalescer::new);
        self
    }

    /// Replace the resizer.
    pub fn with_resizer<R2: ImageResizer + 'static>(self, resizer: R2) -> CacheFillPipeline<S, O, R2> {
        CacheFillPipeline {
            catalog: self.catalog,
            paths: self.paths,
            store: self.store,
            origin: self.origin,
            resizer: Arc::new(resizer),
            logger: self.logger,
            coalescer: self.coalescer,
            stats: self.stats,
        }
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn origin(&self) -> &O {
        &self.origin
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        let coalesced = self
            .coalescer
            .as_ref()
            .map(|c| c.stats().coalesced_requests)
            .unwrap_or(0);
        self.stats.snapshot(coalesced)
    }

    /// Return the bytes of `filename` in `variant`, filling the cache on a miss.
    ///
    /// # Errors
    ///
    /// See [`FillError`]. Every error is reported to the diagnostic sink
    /// before it is returned.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, variant: &str, filename: &str) -> Result<Bytes, FillError> {
        self.stats.record_request();
        let result = match self.catalog.lookup(variant) {
            Ok(def) if def.is_canonical() => self.fill_canonical(def, filename).await,
            Ok(def) => self.fill_derived(def, filename).await,
            Err(_) => Err(FillError::UnknownVariant(variant.to_string())),
        };

        if let Err(e) = &result {
            match e.class() {
                FailureClass::Unavailable => {
                    log_error!(self.logger, "get {}/{} failed: {}", variant, filename, e)
                }
                _ => log_warn!(self.logger, "get {}/{} failed: {}", variant, filename, e),
            }
        }
        result
    }

    fn key_for(&self, def: &VariantDefinition, filename: &str) -> Result<StorageKey, FillError> {
        Ok(self.paths.key_for(def.name(), filename)?)
    }

    async fn read_cached(&self, key: &StorageKey) -> Result<Option<Bytes>, FillError> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => {
                self.stats.record_hit();
                debug!(key = %key, bytes = bytes.len(), "cache hit");
                Ok(Some(bytes))
            }
            Ok(None) => {
                self.stats.record_miss();
                debug!(key = %key, "cache miss");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed");
                Err(FillError::StoreRead(e))
            }
        }
    }

    async fn single_flight<F>(&self, key: &StorageKey, fill: F) -> FillResult
    where
        F: Future<Output = FillResult>,
    {
        match &self.coalescer {
            Some(coalescer) => coalescer.run(key, fill).await,
            None => fill.await,
        }
    }

    async fn fill_canonical(&self, def: &VariantDefinition, filename: &str) -> FillResult {
        let key = self.key_for(def, filename)?;
        if let Some(bytes) = self.read_cached(&key).await? {
            return Ok(bytes);
        }
        self.single_flight(&key, self.fetch_original(&key, filename))
            .await
    }

    async fn fetch_original(&self, key: &StorageKey, filename: &str) -> FillResult {
        self.stats.record_origin_fetch();
        let original = self.origin.fetch(filename).await?;
        info!(filename, origin = self.origin.name(), bytes = original.len(), "fetched original");
        self.write_back(key, original).await
    }

    async fn fill_derived(&self, def: &VariantDefinition, filename: &str) -> FillResult {
        let key = self.key_for(def, filename)?;
        if let Some(bytes) = self.read_cached(&key).await? {
            return Ok(bytes);
        }
        self.single_flight(&key, self.derive_and_store(def, &key, filename))
            .await
    }

    async fn derive_and_store(
        &self,
        def: &VariantDefinition,
        key: &StorageKey,
        filename: &str,
    ) -> FillResult {
        let original = self.fill_canonical(self.catalog.canonical(), filename).await?;
        let derived = self.derive(def, original).await?;
        self.write_back(key, derived).await
    }

    async fn derive(&self, def: &VariantDefinition, original: Bytes) -> FillResult {
        self.stats.record_derivation();
        let resizer = Arc::clone(&self.resizer);
        let owned = def.clone();
        let derived = tokio::task::spawn_blocking(move || resizer.derive(&owned, &original))
            .await
            .map_err(|e| FillError::Encode(format!("resize task failed: {}", e)))??;
        debug!(variant = def.name(), bytes = derived.len(), "variant derived");
        Ok(derived)
    }

    /// Store `data` under `key`, then read it back and compare.
    async fn write_back(&self, key: &StorageKey, data: Bytes) -> FillResult {
        if let Err(e) = self.store.put(key, data.clone()).await {
            self.stats.record_write_failure();
            return Err(FillError::StoreWriteFailed {
                key: key.to_string(),
                source: e,
            });
        }
        self.stats.record_write();

        let reason = match self.store.get(key).await {
            Ok(Some(stored)) if stored == data => {
                debug!(key = %key, bytes = data.len(), "write verified");
                return Ok(data);
            }
            Ok(Some(stored)) => format!(
                "read back {} bytes that differ from the {} written",
                stored.len(),
                data.len()
            ),
            Ok(None) => "key missing after write".to_string(),
            Err(e) => format!("read back failed: {}", e),
        };

        self.stats.record_verification_failure();
        Err(FillError::StoreVerificationFailed {
            key: key.to_string(),
            reason,
        })
    }

    /// Invalidate cached forms of `filename`.
    ///
    /// Flushing the canonical variant deletes every variant of the file,
    /// since they were all derived from it. Any other variant deletes only
    /// its own entry. Failures are reported, never returned.
    #[instrument(level = "debug", skip(self))]
    pub async fn flush(&self, variant: &str, filename: &str) -> FlushReport {
        let def = match self.catalog.lookup(variant) {
            Ok(def) => def,
            Err(e) => {
                log_warn!(self.logger, "flush {}/{} ignored: {}", variant, filename, e);
                return FlushReport::rejected(e.to_string());
            }
        };

        let targets: Vec<&VariantDefinition> = if def.is_canonical() {
            self.catalog.all().iter().collect()
        } else {
            vec![def]
        };

        let keys = match targets
            .iter()
            .map(|t| self.paths.key_for(t.name(), filename))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(keys) => keys,
            Err(e) => {
                log_warn!(self.logger, "flush {}/{} ignored: {}", variant, filename, e);
                return FlushReport::rejected(e.to_string());
            }
        };

        let mut report = FlushReport::default();
        for key in keys {
            self.stats.record_delete();
            match self.store.delete(&key).await {
                Ok(()) => {
                    log_debug!(self.logger, "flushed {}", key);
                    report.removed.push(key);
                }
                Err(e) => {
                    log_warn!(self.logger, "flush of {} failed: {}", key, e);
                    report.failed.push(key);
                }
            }
        }

        info!(
            variant,
            filename,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "flush complete"
        );
        report
    }
}
