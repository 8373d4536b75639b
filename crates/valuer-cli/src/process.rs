//! `process` command: run the image pipeline over a search dump.
//!
//! Storage backend and fetcher are constructed once from config before
//! any lot is attempted, so misconfiguration fails the run up-front.
//! Per-lot fetch/store failures are logged inside the pipeline and show
//! up here only as missing entries in the final mapping.

use std::path::Path;
use std::sync::Arc;

use valuer_core::{AppConfig, Environment};
use valuer_images::{
    placeholder_image, FetcherConfig, ImageFetcher, ImagePipeline, ImageStore, LocalStore,
    LotImage, ObjectStore, PipelineConfig,
};

pub(crate) async fn run_process(
    config: &AppConfig,
    input: &Path,
    limit: Option<usize>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(input).await?;
    let mut lots = valuer_core::parse_search_results(&raw)?;
    if let Some(limit) = limit {
        lots.truncate(limit);
    }
    if lots.is_empty() {
        println!("no lots found in {}; nothing to process", input.display());
        return Ok(());
    }
    tracing::info!(lots = lots.len(), input = %input.display(), "parsed search dump");

    let store: Arc<dyn ImageStore> = if config.use_remote_storage {
        Arc::new(ObjectStore::from_app_config(config)?)
    } else {
        Arc::new(LocalStore::new(config.local_storage_path.clone()).await?)
    };
    let fetcher = ImageFetcher::new(FetcherConfig::from_app_config(config)).await?;

    let mut pipeline = ImagePipeline::new(fetcher, store, PipelineConfig::from_app_config(config));
    // Synthetic fallback images are a development convenience only.
    if config.env == Environment::Development {
        pipeline = pipeline.with_fallback(Box::new(|_lot| placeholder_image()));
    }

    let images: Vec<LotImage> = lots.iter().map(LotImage::from).collect();
    let references = pipeline.process_all(&images).await;

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&references)?;
        tokio::fs::write(output, json).await?;
        println!("wrote reference mapping to {}", output.display());
    }

    println!(
        "processed {} lots: {} images stored, {} missing",
        lots.len(),
        references.len(),
        lots.len() - references.len()
    );
    Ok(())
}
