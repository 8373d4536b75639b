use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, loaded once at startup and passed by
/// reference into the image pipeline and storage backends.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,

    /// When `true`, images land in the object-storage bucket; otherwise
    /// they are written under `local_storage_path`.
    pub use_remote_storage: bool,
    pub storage_bucket: Option<String>,
    pub storage_region: String,
    /// Custom S3-compatible endpoint. `None` means the region's default.
    pub storage_endpoint: Option<String>,
    /// When set, stored objects are referenced as
    /// `{storage_public_base_url}/{path}` instead of `s3://bucket/path`.
    pub storage_public_base_url: Option<String>,
    pub local_storage_path: PathBuf,

    pub base_image_url: String,
    /// Alternate CDN bases tried in order after the primary fails.
    pub alt_image_urls: Vec<String>,
    /// Host-header substitutes probed against the primary URL.
    pub host_header_aliases: Vec<String>,
    /// Resolve the primary origin to an IP at startup and add direct-IP
    /// fetch strategies. Environment-fragile; off by default.
    pub probe_origin_ip: bool,
    pub image_referer: String,

    pub optimize_images: bool,
    pub max_image_dimension: u32,
    pub image_batch_size: usize,
    pub fetch_timeout_secs: u64,
    /// Additional attempts after the first failure; 2 means 3 attempts total.
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_ms: u64,
}
