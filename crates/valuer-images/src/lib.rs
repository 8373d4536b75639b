//! Image acquisition and storage for the auction-lot catalog.
//!
//! Converts unreliable, bot-filtered CDN photo references into durable
//! bytes at deterministic storage locations: multi-strategy fetch with
//! retry/backoff, bounded-dimension transcoding, local or object-storage
//! persistence, and batch orchestration with partial-failure tolerance.

pub mod error;
pub mod fetch;
pub mod path;
pub mod pipeline;
pub mod placeholder;
pub mod sentinel;
pub mod storage;
pub mod transcode;
pub mod types;

mod retry;

pub use error::ImageError;
pub use fetch::{FetcherConfig, ImageFetcher};
pub use path::storage_path;
pub use pipeline::{ImagePipeline, PipelineConfig};
pub use placeholder::placeholder_image;
pub use sentinel::TEST_SENTINEL_PREFIX;
pub use storage::{ImageStore, LocalStore, ObjectStore, PutMetadata, StorageReference};
pub use transcode::transcode;
pub use types::LotImage;
