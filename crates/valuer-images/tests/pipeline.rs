//! Integration tests for `ImagePipeline`: batching, idempotence,
//! partial-failure isolation, the concurrency bound, and the fallback
//! hook. Network-backed cases use `wiremock`; concurrency cases use
//! `test:` sentinel references so no server is involved.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use valuer_images::{
    placeholder_image, FetcherConfig, ImageError, ImageFetcher, ImagePipeline, ImageStore,
    LocalStore, LotImage, PipelineConfig, PutMetadata, StorageReference,
};

fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([80, 90, 100]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("in-memory JPEG encode");
    buf
}

fn image_response(body: Vec<u8>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "image/jpeg")
        .set_body_bytes(body)
}

async fn fetcher_for(server: &MockServer) -> ImageFetcher {
    ImageFetcher::new(FetcherConfig {
        base_url: format!("{}/housePhotos/", server.uri()),
        alt_base_urls: vec![],
        host_header_aliases: vec![],
        probe_origin_ip: false,
        referer: "https://www.example.com/".to_owned(),
        timeout_secs: 5,
        max_retries: 0,
        backoff_base_ms: 0,
    })
    .await
    .expect("failed to build test ImageFetcher")
}

/// Fetcher whose base URL is never contacted — for sentinel-only runs.
async fn offline_fetcher() -> ImageFetcher {
    ImageFetcher::new(FetcherConfig {
        base_url: "https://image.invaluable.com/housePhotos/".to_owned(),
        alt_base_urls: vec![],
        host_header_aliases: vec![],
        probe_origin_ip: false,
        referer: "https://www.example.com/".to_owned(),
        timeout_secs: 5,
        max_retries: 0,
        backoff_base_ms: 0,
    })
    .await
    .expect("failed to build offline ImageFetcher")
}

fn pipeline_config(batch_size: usize) -> PipelineConfig {
    PipelineConfig {
        batch_size,
        optimize_images: true,
        max_image_dimension: 1200,
    }
}

/// Store wrapper that tracks the peak number of concurrent `put` calls.
struct CountingStore {
    inner: LocalStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl CountingStore {
    fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageStore for CountingStore {
    async fn exists(&self, path: &str) -> bool {
        self.inner.exists(path).await
    }

    async fn put(
        &self,
        bytes: &[u8],
        path: &str,
        meta: PutMetadata<'_>,
    ) -> Result<StorageReference, ImageError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Widen the window so overlapping tasks are actually observed.
        tokio::time::sleep(Duration::from_millis(25)).await;
        let result = self.inner.put(bytes, path, meta).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn reference_for(&self, path: &str) -> StorageReference {
        self.inner.reference_for(path)
    }
}

// ---------------------------------------------------------------------------
// Test 1 – concurrency never exceeds the batch size
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrency_is_bounded_by_batch_size() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CountingStore::new(
        LocalStore::new(dir.path().join("images")).await.unwrap(),
    ));

    let lots: Vec<LotImage> = (0..12)
        .map(|i| LotImage::new(format!("LOT-{i}"), "Test House", format!("test:lot-{i}")))
        .collect();

    let pipeline = ImagePipeline::new(offline_fetcher().await, store.clone(), pipeline_config(5));
    let results = pipeline.process_all(&lots).await;

    assert_eq!(results.len(), 12, "all sentinel lots should succeed");
    let peak = store.peak.load(Ordering::SeqCst);
    assert!(peak <= 5, "peak concurrency {peak} exceeded batch size 5");
    assert!(peak >= 2, "batch members should actually overlap, peak was {peak}");
}

// ---------------------------------------------------------------------------
// Test 2 – one failing lot never takes down its batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_lot_is_isolated_from_the_batch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/housePhotos/h/ok-a.jpg"))
        .respond_with(image_response(jpeg_fixture(8, 8)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/housePhotos/h/broken.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/housePhotos/h/ok-b.jpg"))
        .respond_with(image_response(jpeg_fixture(8, 8)))
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10));

    let lots = vec![
        LotImage::new("A", "House", "h/ok-a.jpg"),
        LotImage::new("B", "House", "h/broken.jpg"),
        LotImage::new("C", "House", "h/ok-b.jpg"),
    ];
    let results = pipeline.process_all(&lots).await;

    assert_eq!(results.len(), 2, "exactly the two healthy lots succeed");
    assert!(results.contains_key("A"));
    assert!(!results.contains_key("B"), "failing lot must be absent");
    assert!(results.contains_key("C"));
}

// ---------------------------------------------------------------------------
// Test 3 – reprocessing is idempotent and skips the network
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_run_reuses_stored_image_without_fetching() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // The existence check must short-circuit the second run's fetch.
    Mock::given(method("GET"))
        .and(path("/housePhotos/h/once.jpg"))
        .respond_with(image_response(jpeg_fixture(8, 8)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10));

    let lots = vec![LotImage::new("LOT-1", "Some House", "h/once.jpg")];
    let first = pipeline.process_all(&lots).await;
    let second = pipeline.process_all(&lots).await;

    assert_eq!(first.get("LOT-1"), second.get("LOT-1"));
    assert!(first.contains_key("LOT-1"));
}

// ---------------------------------------------------------------------------
// Test 4 – photo-less lots are skipped, not failed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_photo_reference_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(offline_fetcher().await, store, pipeline_config(10));

    let lots = vec![LotImage::new("NO-PHOTO", "House", "")];
    let results = pipeline.process_all(&lots).await;

    assert!(results.is_empty());
}

// ---------------------------------------------------------------------------
// Test 5 – fallback hook substitutes a generated image on fetch failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fallback_substitutes_generated_image_when_fetch_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10))
        .with_fallback(Box::new(|_lot| placeholder_image()));

    let lots = vec![LotImage::new("LOT-1", "Some House", "h/missing.jpg")];
    let results = pipeline.process_all(&lots).await;

    assert!(results.contains_key("LOT-1"), "fallback should yield a reference");
    let stored = std::fs::read(dir.path().join("images/some_house/LOT-1/missing.jpg")).unwrap();
    assert!(image::load_from_memory(&stored).is_ok());
}

// ---------------------------------------------------------------------------
// Test 6 – without a fallback the failing lot is simply absent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_failure_without_fallback_yields_absent_entry() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10));

    let lots = vec![LotImage::new("LOT-1", "House", "h/missing.jpg")];
    let results = pipeline.process_all(&lots).await;

    assert!(results.is_empty());
}

// ---------------------------------------------------------------------------
// Test 7 – optimization disabled stores the raw fetched bytes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raw_bytes_are_stored_when_optimization_is_disabled() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let fixture = jpeg_fixture(16, 16);

    Mock::given(method("GET"))
        .and(path("/housePhotos/h/raw.jpg"))
        .respond_with(image_response(fixture.clone()))
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let mut config = pipeline_config(10);
    config.optimize_images = false;
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, config);

    let lots = vec![LotImage::new("LOT-1", "House", "h/raw.jpg")];
    pipeline.process_all(&lots).await;

    let stored = std::fs::read(dir.path().join("images/house/LOT-1/raw.jpg")).unwrap();
    assert_eq!(stored, fixture, "bytes must be stored untouched");
}

// ---------------------------------------------------------------------------
// Test 8 – oversized images come out bounded when optimization is on
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_image_is_downscaled_before_storage() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/housePhotos/h/big.jpg"))
        .respond_with(image_response(jpeg_fixture(2400, 1200)))
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10));

    let lots = vec![LotImage::new("LOT-1", "House", "h/big.jpg")];
    pipeline.process_all(&lots).await;

    let stored = std::fs::read(dir.path().join("images/house/LOT-1/big.jpg")).unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1200, 600));
}

// ---------------------------------------------------------------------------
// Test 9 – undecodable bytes are never persisted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn undecodable_body_fails_the_lot_without_storing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Image content type, garbage body: passes fetch, fails transcode.
    Mock::given(method("GET"))
        .and(path("/housePhotos/h/corrupt.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/jpeg")
                .set_body_bytes(b"not actually a jpeg".to_vec()),
        )
        .mount(&server)
        .await;

    let store = Arc::new(LocalStore::new(dir.path().join("images")).await.unwrap());
    let pipeline = ImagePipeline::new(fetcher_for(&server).await, store, pipeline_config(10));

    let lots = vec![LotImage::new("LOT-1", "House", "h/corrupt.jpg")];
    let results = pipeline.process_all(&lots).await;

    assert!(results.is_empty(), "corrupt image must not produce a reference");
    assert!(
        !dir.path().join("images/house/LOT-1/corrupt.jpg").exists(),
        "undecoded bytes must never be persisted"
    );
}
