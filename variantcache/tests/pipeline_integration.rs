//! Integration tests for the cache-fill pipeline.
//!
//! These drive `CacheFillPipeline` end to end against an in-memory (or
//! on-disk) store and a scripted origin, checking:
//! - cache fills populate the canonical entry before the variant
//! - repeat requests are served without origin or resize work
//! - failure paths report the right error and leave the store clean
//! - flush semantics for canonical and derived variants
//! - concurrent misses collapse into one fill
//!
//! Run with: `cargo test --test pipeline_integration`

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use variantcache::log::{LogLevel, MemoryLogger};
use variantcache::origin::{OriginClient, OriginError};
use variantcache::pipeline::{CacheFillPipeline, FailureClass, FillError};
use variantcache::resize::{ImageResizer, ResizeError, Resizer};
use variantcache::store::{
    BlobStore, DirectoryStrategy, DiskBlobStore, MemoryBlobStore, PathStrategy, StoreFault,
};
use variantcache::variant::{OutputEncoding, ScaleMode, VariantCatalog, VariantDefinition};

// ============================================================================
// Test doubles
// ============================================================================

/// Origin serving a fixed set of images, counting fetches.
struct FakeOrigin {
    images: HashMap<String, Bytes>,
    fetches: AtomicUsize,
    delay: Duration,
}

impl FakeOrigin {
    fn new() -> Self {
        Self {
            images: HashMap::new(),
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn with_image(mut self, filename: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(filename.to_string(), Bytes::from(bytes));
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl OriginClient for FakeOrigin {
    async fn fetch(&self, filename: &str) -> Result<Bytes, OriginError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.images
            .get(filename)
            .cloned()
            .ok_or_else(|| OriginError::NotFound {
                filename: filename.to_string(),
                reason: "HTTP 404".to_string(),
            })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Real resizer that counts invocations.
struct CountingResizer {
    inner: Resizer,
    calls: Arc<AtomicUsize>,
}

impl ImageResizer for CountingResizer {
    fn derive(&self, def: &VariantDefinition, original: &[u8]) -> Result<Bytes, ResizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.derive(def, original)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn png_image(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Catalog with a 100x100 CROP thumbnail and a passthrough original.
fn crop_catalog() -> Arc<VariantCatalog> {
    Arc::new(
        VariantCatalog::new(vec![
            VariantDefinition::new("thumbnail", 100, 100)
                .with_scale_mode(ScaleMode::Crop)
                .with_encoding(OutputEncoding::Png),
            VariantDefinition::canonical("original"),
        ])
        .unwrap(),
    )
}

struct Harness {
    pipeline: CacheFillPipeline<MemoryBlobStore, FakeOrigin, CountingResizer>,
    resizes: Arc<AtomicUsize>,
    logger: Arc<MemoryLogger>,
}

fn harness(catalog: Arc<VariantCatalog>, origin: FakeOrigin) -> Harness {
    let resizes = Arc::new(AtomicUsize::new(0));
    let logger = Arc::new(MemoryLogger::new());
    let pipeline = CacheFillPipeline::new(catalog, MemoryBlobStore::new(), origin)
        .with_logger(logger.clone())
        .with_resizer(CountingResizer {
            inner: Resizer::new(),
            calls: Arc::clone(&resizes),
        });
    Harness {
        pipeline,
        resizes,
        logger,
    }
}

fn key(variant: &str, filename: &str) -> variantcache::store::StorageKey {
    DirectoryStrategy.key_for(variant, filename).unwrap()
}

// ============================================================================
// Cache fill
// ============================================================================

#[tokio::test]
async fn test_first_get_populates_canonical_and_variant() {
    let source = png_image(400, 200);
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("shoes/red.png", source.clone()),
    );

    let bytes = h.pipeline.get("thumbnail", "shoes/red.png").await.unwrap();

    let store = h.pipeline.store();
    assert_eq!(store.len(), 2);
    let canonical = store.get(&key("original", "shoes/red.png")).await.unwrap();
    assert_eq!(canonical, Some(Bytes::from(source)), "canonical stored untouched");
    let variant = store.get(&key("thumbnail", "shoes/red.png")).await.unwrap();
    assert_eq!(variant, Some(bytes.clone()));

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 100));
    assert_eq!(h.pipeline.origin().fetches(), 1);
    assert_eq!(h.resizes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_crop_scenario_takes_centre_of_height_matched_image() {
    // Left and right quarters black, centre half white
    let img = RgbImage::from_fn(400, 200, |x, _| {
        if (100..300).contains(&x) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("band.png", buffer.into_inner()),
    );

    let bytes = h.pipeline.get("thumbnail", "band.png").await.unwrap();

    // Intermediate is 200x100; columns 50..150 are all from the white band
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (100, 100));
    assert_eq!(*decoded.get_pixel(10, 50), Rgb([255, 255, 255]));
    assert_eq!(*decoded.get_pixel(90, 50), Rgb([255, 255, 255]));
}

#[tokio::test]
async fn test_second_get_is_served_from_store() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(300, 300)),
    );

    let first = h.pipeline.get("thumbnail", "a.png").await.unwrap();
    let second = h.pipeline.get("Thumbnail", "a.png").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.pipeline.origin().fetches(), 1);
    assert_eq!(h.resizes.load(Ordering::SeqCst), 1);
    assert_eq!(h.pipeline.stats().derivations, 1);
}

#[tokio::test]
async fn test_canonical_get_populates_one_entry() {
    let source = png_image(50, 50);
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", source.clone()),
    );

    let bytes = h.pipeline.get("original", "a.png").await.unwrap();

    assert_eq!(bytes, Bytes::from(source));
    assert_eq!(h.pipeline.store().len(), 1);
    assert_eq!(h.resizes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_variant_built_from_cached_canonical() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(120, 80)),
    );

    h.pipeline.get("original", "a.png").await.unwrap();
    h.pipeline.get("thumbnail", "a.png").await.unwrap();

    assert_eq!(h.pipeline.origin().fetches(), 1);
    assert_eq!(h.pipeline.store().len(), 2);
}

#[tokio::test]
async fn test_builtin_catalog_every_variant() {
    let h = harness(
        Arc::new(VariantCatalog::builtin()),
        FakeOrigin::new().with_image("a.png", png_image(640, 480)),
    );

    for def in VariantCatalog::builtin().all() {
        let bytes = h.pipeline.get(def.name(), "a.png").await.unwrap();
        if !def.is_canonical() {
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(
                (decoded.width(), decoded.height()),
                (def.width(), def.height()),
                "variant {}",
                def.name()
            );
        }
    }
    assert_eq!(h.pipeline.origin().fetches(), 1);
    assert_eq!(h.pipeline.store().len(), VariantCatalog::builtin().len());
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_unknown_variant_does_no_io() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(10, 10)),
    );

    let err = h.pipeline.get("poster", "a.png").await.unwrap_err();

    assert_eq!(err, FillError::UnknownVariant("poster".to_string()));
    assert_eq!(err.class(), FailureClass::NotFound);
    assert_eq!(h.pipeline.store().op_counts().total(), 0);
    assert_eq!(h.pipeline.origin().fetches(), 0);
    assert!(h.logger.contains(LogLevel::Warn, "poster"));
}

#[tokio::test]
async fn test_invalid_filename_does_no_io() {
    let h = harness(crop_catalog(), FakeOrigin::new());

    let err = h.pipeline.get("thumbnail", "../etc/passwd").await.unwrap_err();

    assert!(matches!(err, FillError::InvalidFilename(_)));
    assert_eq!(err.http_status(), 400);
    assert_eq!(h.pipeline.store().op_counts().total(), 0);
    assert_eq!(h.pipeline.origin().fetches(), 0);
}

#[tokio::test]
async fn test_origin_not_found_writes_nothing() {
    let h = harness(crop_catalog(), FakeOrigin::new());

    let err = h.pipeline.get("original", "missing.png").await.unwrap_err();

    assert!(matches!(err, FillError::NotFound { .. }));
    assert_eq!(err.http_status(), 404);
    assert_eq!(h.pipeline.store().op_counts().puts, 0);
    assert!(h.pipeline.store().is_empty());
    assert!(h.logger.contains(LogLevel::Warn, "missing.png"));
}

#[tokio::test]
async fn test_origin_not_found_for_variant() {
    let h = harness(crop_catalog(), FakeOrigin::new());

    let err = h.pipeline.get("thumbnail", "missing.png").await.unwrap_err();

    assert!(matches!(err, FillError::NotFound { .. }));
    assert!(h.pipeline.store().is_empty());
    assert_eq!(h.resizes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_original() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", b"not an image".to_vec()),
    );

    let err = h.pipeline.get("thumbnail", "a.png").await.unwrap_err();

    assert!(matches!(err, FillError::Decode(_)));
    assert_eq!(err.class(), FailureClass::Unavailable);
    // The canonical bytes were still cached before derivation failed
    assert!(h.pipeline.store().contains(&key("original", "a.png")));
    assert!(!h.pipeline.store().contains(&key("thumbnail", "a.png")));
}

#[tokio::test]
async fn test_verification_mismatch() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(40, 40)),
    );
    h.pipeline.store().inject(StoreFault::TruncateOnWrite);

    let err = h.pipeline.get("original", "a.png").await.unwrap_err();

    assert!(matches!(err, FillError::StoreVerificationFailed { .. }));
    assert_eq!(h.pipeline.stats().verification_failures, 1);
    assert!(h.logger.contains(LogLevel::Error, "verification"));
}

#[tokio::test]
async fn test_write_failure() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(40, 40)),
    );
    h.pipeline.store().inject(StoreFault::PutFails);

    let err = h.pipeline.get("thumbnail", "a.png").await.unwrap_err();

    assert!(matches!(err, FillError::StoreWriteFailed { .. }));
    assert_eq!(h.resizes.load(Ordering::SeqCst), 0);
    assert_eq!(h.pipeline.stats().write_failures, 1);
}

#[tokio::test]
async fn test_store_read_failure() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new().with_image("a.png", png_image(40, 40)),
    );
    h.pipeline.store().inject(StoreFault::GetFails);

    let err = h.pipeline.get("thumbnail", "a.png").await.unwrap_err();

    assert!(matches!(err, FillError::StoreRead(_)));
    assert_eq!(h.pipeline.origin().fetches(), 0);
}

// ============================================================================
// Flush
// ============================================================================

async fn populated() -> Harness {
    let h = harness(
        Arc::new(VariantCatalog::builtin()),
        FakeOrigin::new().with_image("a.png", png_image(200, 100)),
    );
    for variant in ["thumbnail", "crop", "skew"] {
        h.pipeline.get(variant, "a.png").await.unwrap();
    }
    h
}

#[tokio::test]
async fn test_flush_canonical_removes_every_variant() {
    let h = populated().await;
    assert_eq!(h.pipeline.store().len(), 4);

    let report = h.pipeline.flush("original", "a.png").await;

    assert!(report.is_clean());
    assert_eq!(report.removed.len(), VariantCatalog::builtin().len());
    assert!(h.pipeline.store().is_empty());
}

#[tokio::test]
async fn test_flush_variant_removes_only_that_entry() {
    let h = populated().await;

    let report = h.pipeline.flush("crop", "a.png").await;

    assert_eq!(report.removed, vec![key("crop", "a.png")]);
    let store = h.pipeline.store();
    assert!(!store.contains(&key("crop", "a.png")));
    assert!(store.contains(&key("thumbnail", "a.png")));
    assert!(store.contains(&key("original", "a.png")));
}

#[tokio::test]
async fn test_flush_failures_are_swallowed() {
    let h = populated().await;
    h.pipeline.store().inject(StoreFault::DeleteFails);

    let report = h.pipeline.flush("original", "a.png").await;

    assert_eq!(report.failure_count(), VariantCatalog::builtin().len());
    assert!(report.removed.is_empty());
    assert_eq!(h.pipeline.store().len(), 4);
    assert!(h.logger.contains(LogLevel::Warn, "flush"));
}

#[tokio::test]
async fn test_flush_unknown_variant_does_no_io() {
    let h = harness(crop_catalog(), FakeOrigin::new());

    let report = h.pipeline.flush("poster", "a.png").await;

    assert!(report.rejected.is_some());
    assert_eq!(h.pipeline.store().op_counts().deletes, 0);
}

#[tokio::test]
async fn test_get_after_flush_refills() {
    let h = populated().await;
    h.pipeline.flush("original", "a.png").await;

    h.pipeline.get("thumbnail", "a.png").await.unwrap();

    assert_eq!(h.pipeline.origin().fetches(), 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_misses_fill_once() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new()
            .with_image("a.png", png_image(300, 200))
            .with_delay(Duration::from_millis(50)),
    );
    let pipeline = Arc::new(h.pipeline);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.get("thumbnail", "a.png").await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(pipeline.origin().fetches(), 1);
    assert_eq!(h.resizes.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.stats().coalesced, 7);
}

#[tokio::test]
async fn test_without_coalescing_results_still_agree() {
    let h = harness(
        crop_catalog(),
        FakeOrigin::new()
            .with_image("a.png", png_image(300, 200))
            .with_delay(Duration::from_millis(20)),
    );
    let pipeline = Arc::new(h.pipeline.with_coalescing(false));

    let a = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.get("thumbnail", "a.png").await })
    };
    let b = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.get("thumbnail", "a.png").await })
    };

    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
    assert_eq!(a, b);
    assert_eq!(pipeline.origin().fetches(), 2);
    assert_eq!(pipeline.stats().coalesced, 0);
}

// ============================================================================
// Disk store
// ============================================================================

#[tokio::test]
async fn test_disk_store_end_to_end() {
    let dir = TempDir::new().unwrap();
    let pipeline = CacheFillPipeline::new(
        crop_catalog(),
        DiskBlobStore::new(dir.path()),
        FakeOrigin::new().with_image("abcdefgh.png", png_image(80, 60)),
    );

    let bytes = pipeline.get("thumbnail", "abcdefgh.png").await.unwrap();

    let path = dir
        .path()
        .join("thumbnail")
        .join("abcd")
        .join("efgh")
        .join("abcdefgh.png");
    assert_eq!(std::fs::read(&path).unwrap(), bytes.to_vec());
    assert!(dir.path().join("original").is_dir());

    pipeline.flush("original", "abcdefgh.png").await;
    assert!(!path.exists());
}
