//! Pluggable image storage: local filesystem or S3-compatible object
//! storage, selected once at process start and injected into the
//! pipeline as a trait object.

mod local;
mod object;

pub use local::LocalStore;
pub use object::ObjectStore;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ImageError;

/// Durable, addressable location of a persisted image: `local://` path,
/// public HTTPS URL, or `s3://bucket/path` depending on backend and
/// addressing mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StorageReference(String);

impl StorageReference {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive metadata recorded alongside stored objects.
#[derive(Debug, Clone, Copy)]
pub struct PutMetadata<'a> {
    /// The photo reference the bytes were fetched from.
    pub original_path: &'a str,
    pub lot_ref: &'a str,
    pub house_name: &'a str,
}

/// Storage backend capability set used by the pipeline.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Whether an image already exists at `path`.
    ///
    /// Probe failures are logged and reported as "absent" so the pipeline
    /// re-attempts the lot instead of silently skipping it.
    async fn exists(&self, path: &str) -> bool;

    /// Persists `bytes` at `path`, overwriting existing content, and
    /// returns the addressable reference.
    async fn put(
        &self,
        bytes: &[u8],
        path: &str,
        meta: PutMetadata<'_>,
    ) -> Result<StorageReference, ImageError>;

    /// Addressable reference for `path` without performing I/O. For a
    /// path that `exists`, this equals what `put` would have returned.
    fn reference_for(&self, path: &str) -> StorageReference;
}

/// Content type for an object from its target file extension.
///
/// Defaults to `image/jpeg` — the pipeline's transcoder only ever emits
/// JPEG or PNG, and raw passthrough bytes are overwhelmingly JPEG.
pub(crate) fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
