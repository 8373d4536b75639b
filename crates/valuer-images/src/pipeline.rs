//! Batch orchestration: drives fetch → transcode → store over a
//! collection of lots under a bounded-concurrency batch regime.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;
use valuer_core::AppConfig;

use crate::error::ImageError;
use crate::fetch::ImageFetcher;
use crate::path::storage_path;
use crate::storage::{ImageStore, PutMetadata, StorageReference};
use crate::transcode::transcode;
use crate::types::LotImage;

/// Caller-supplied fallback invoked when every fetch strategy for a lot
/// fails. Returning an error marks the lot failed; the pipeline never
/// synthesizes images on its own.
pub type FallbackImage = dyn Fn(&LotImage) -> Result<Vec<u8>, ImageError> + Send + Sync;

/// Orchestrator settings, projected from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Lots processed concurrently per batch; also the peak concurrency.
    pub batch_size: usize,
    /// When `false`, fetched bytes are stored untouched.
    pub optimize_images: bool,
    pub max_image_dimension: u32,
}

impl PipelineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.image_batch_size,
            optimize_images: config.optimize_images,
            max_image_dimension: config.max_image_dimension,
        }
    }
}

/// Drives the image pipeline over a collection of lots.
///
/// Lots are partitioned into fixed-size batches; within a batch every lot
/// runs concurrently, and batch N+1 does not start until batch N has
/// fully completed, so peak concurrency equals the batch size rather than
/// the input size. One lot's failure never aborts its batch or the run.
pub struct ImagePipeline {
    fetcher: ImageFetcher,
    store: Arc<dyn ImageStore>,
    config: PipelineConfig,
    fallback: Option<Box<FallbackImage>>,
}

impl ImagePipeline {
    #[must_use]
    pub fn new(fetcher: ImageFetcher, store: Arc<dyn ImageStore>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
            fallback: None,
        }
    }

    /// Installs a fallback image source used when a lot's fetch fails.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<FallbackImage>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Processes every lot and returns `lot_ref -> storage reference`.
    ///
    /// Failures and photo-less lots are absent from the mapping; the
    /// caller decides whether missing entries block downstream
    /// persistence. Key order carries no meaning.
    pub async fn process_all(&self, lots: &[LotImage]) -> HashMap<String, StorageReference> {
        let mut results = HashMap::with_capacity(lots.len());
        let batch_size = self.config.batch_size.max(1);
        let batch_count = lots.len().div_ceil(batch_size);

        for (index, batch) in lots.chunks(batch_size).enumerate() {
            tracing::info!(
                batch = index + 1,
                batches = batch_count,
                lots = batch.len(),
                "processing image batch"
            );

            let outcomes =
                future::join_all(batch.iter().map(|lot| self.process_single(lot))).await;

            for (lot, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(Some(reference)) => {
                        results.insert(lot.lot_ref.clone(), reference);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(
                            lot_ref = %lot.lot_ref,
                            house = %lot.house_name,
                            error = %err,
                            "image processing failed for lot"
                        );
                    }
                }
            }
        }

        tracing::info!(
            processed = results.len(),
            missing = lots.len() - results.len(),
            "image processing completed"
        );
        results
    }

    /// Full treatment of one lot, short-circuiting on the first failure.
    ///
    /// `Ok(None)` means the lot was skipped (no photo reference); errors
    /// are converted to absent entries by [`Self::process_all`].
    async fn process_single(&self, lot: &LotImage) -> Result<Option<StorageReference>, ImageError> {
        if lot.photo_path.is_empty() {
            tracing::debug!(lot_ref = %lot.lot_ref, "lot has no photo reference — skipping");
            return Ok(None);
        }

        let path = storage_path(&lot.house_name, &lot.lot_ref, &lot.photo_path);

        if self.store.exists(&path).await {
            tracing::debug!(
                lot_ref = %lot.lot_ref,
                path = %path,
                "image already stored — reusing reference"
            );
            return Ok(Some(self.store.reference_for(&path)));
        }

        let bytes = match self.fetcher.fetch(&lot.photo_path).await {
            Ok(bytes) => {
                if self.config.optimize_images {
                    transcode(&bytes, self.config.max_image_dimension)?
                } else {
                    bytes
                }
            }
            Err(err) => match &self.fallback {
                // Fallback bytes are synthesized at target quality and
                // are not transcoded again.
                Some(fallback) => {
                    tracing::warn!(
                        lot_ref = %lot.lot_ref,
                        error = %err,
                        "fetch failed — substituting generated fallback image"
                    );
                    fallback(lot)?
                }
                None => return Err(err),
            },
        };

        let meta = PutMetadata {
            original_path: &lot.photo_path,
            lot_ref: &lot.lot_ref,
            house_name: &lot.house_name,
        };
        let reference = self.store.put(&bytes, &path, meta).await?;
        Ok(Some(reference))
    }
}
