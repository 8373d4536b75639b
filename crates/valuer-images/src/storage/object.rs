use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use valuer_core::AppConfig;

use super::{content_type_for, ImageStore, PutMetadata, StorageReference};
use crate::error::ImageError;

/// S3-compatible object storage backend.
///
/// Uploads carry a content type derived from the target extension and
/// descriptive object tags (original photo reference, lot ref, house
/// name). Public visibility of stored objects rides on the bucket's own
/// access policy; when `public_base_url` is configured, references are
/// public HTTPS URLs under it, otherwise `s3://bucket/path` URIs.
pub struct ObjectStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    public_base_url: Option<String>,
}

impl ObjectStore {
    /// Creates a store for `bucket_name`, reading credentials from the
    /// process environment.
    ///
    /// `endpoint` selects a custom S3-compatible service (path-style
    /// addressing); `None` targets the AWS endpoint for `region`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Storage`] when credentials are unavailable
    /// or the bucket handle cannot be constructed. This surfaces
    /// misconfiguration at startup, before any lot is attempted.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        public_base_url: Option<String>,
    ) -> Result<Self, ImageError> {
        let s3_region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_owned(),
                endpoint: endpoint.trim_end_matches('/').to_owned(),
            },
            None => Region::Custom {
                region: region.to_owned(),
                endpoint: format!("https://s3.{region}.amazonaws.com"),
            },
        };

        let credentials =
            Credentials::default().map_err(|e| ImageError::storage(bucket_name, e))?;
        let mut bucket = Bucket::new(bucket_name, s3_region, credentials)
            .map_err(|e| ImageError::storage(bucket_name, e))?;
        if endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_owned(),
            public_base_url,
        })
    }

    /// Builds the store from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Storage`] when the bucket name is missing or
    /// [`Self::new`] fails.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ImageError> {
        let bucket_name = config.storage_bucket.as_deref().ok_or_else(|| {
            ImageError::storage("", "remote storage enabled but no bucket configured")
        })?;
        Self::new(
            bucket_name,
            &config.storage_region,
            config.storage_endpoint.as_deref(),
            config.storage_public_base_url.clone(),
        )
    }
}

/// Addressable URI for an object: public HTTPS URL when a public base is
/// configured, `s3://` otherwise.
fn object_uri(public_base_url: Option<&str>, bucket_name: &str, path: &str) -> String {
    match public_base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
        None => format!("s3://{bucket_name}/{path}"),
    }
}

#[async_trait]
impl ImageStore for ObjectStore {
    async fn exists(&self, path: &str) -> bool {
        match self.bucket.head_object(path).await {
            Ok((_, 200)) => true,
            Ok((_, status)) => {
                if status != 404 {
                    tracing::warn!(path, status, "unexpected head_object status — treating as absent");
                }
                false
            }
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
        meta: PutMetadata<'_>,
    ) -> Result<StorageReference, ImageError> {
        let content_type = content_type_for(path);
        let response = self
            .bucket
            .put_object_with_content_type(path, bytes, content_type)
            .await
            .map_err(|e| ImageError::storage(path, e))?;
        if response.status_code() != 200 {
            return Err(ImageError::storage(
                path,
                format!("upload returned HTTP {}", response.status_code()),
            ));
        }

        // Descriptive tags for provenance; a tagging failure does not
        // invalidate the stored object.
        let tags = [
            ("original_path", meta.original_path),
            ("lot_ref", meta.lot_ref),
            ("house_name", meta.house_name),
        ];
        if let Err(e) = self.bucket.put_object_tagging(path, &tags).await {
            tracing::warn!(path, error = %e, "could not tag stored image");
        }

        tracing::info!(path, bytes = bytes.len(), "uploaded image to bucket");
        Ok(self.reference_for(path))
    }

    fn reference_for(&self, path: &str) -> StorageReference {
        StorageReference::new(object_uri(
            self.public_base_url.as_deref(),
            &self.bucket_name,
            path,
        ))
    }
}
