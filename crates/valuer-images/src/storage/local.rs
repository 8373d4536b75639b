use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{ImageStore, PutMetadata, StorageReference};
use crate::error::ImageError;

/// Filesystem-backed image store rooted at a configured directory.
///
/// References are `local://` URIs over absolute paths so callers can
/// distinguish them from object-storage URLs in persisted records.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Creates the store, creating and canonicalizing the root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Storage`] if the root cannot be created or
    /// resolved.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, ImageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| ImageError::storage(&root.display().to_string(), e))?;
        let root = fs::canonicalize(&root)
            .await
            .map_err(|e| ImageError::storage(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    fn absolute(&self, path: &str) -> PathBuf {
        // Relative paths only; a leading slash would escape the root.
        self.root.join(path.trim_start_matches('/'))
    }

    fn uri_for(path: &Path) -> String {
        format!("local://{}", path.display())
    }
}

#[async_trait]
impl ImageStore for LocalStore {
    async fn exists(&self, path: &str) -> bool {
        match fs::try_exists(self.absolute(path)).await {
            Ok(present) => present,
            Err(e) => {
                tracing::warn!(path, error = %e, "existence check failed — treating as absent");
                false
            }
        }
    }

    async fn put(
        &self,
        bytes: &[u8],
        path: &str,
        _meta: PutMetadata<'_>,
    ) -> Result<StorageReference, ImageError> {
        let full = self.absolute(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ImageError::storage(path, e))?;
        }
        fs::write(&full, bytes)
            .await
            .map_err(|e| ImageError::storage(path, e))?;
        tracing::debug!(path, bytes = bytes.len(), "saved image locally");
        Ok(StorageReference::new(Self::uri_for(&full)))
    }

    fn reference_for(&self, path: &str) -> StorageReference {
        StorageReference::new(Self::uri_for(&self.absolute(path)))
    }
}
