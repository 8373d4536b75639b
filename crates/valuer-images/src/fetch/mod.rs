//! Multi-strategy image fetching with retry and backoff.

mod origin;
mod strategy;

use std::net::IpAddr;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use valuer_core::AppConfig;

use crate::error::ImageError;
use crate::retry::{is_retriable, retry_with_backoff};
use crate::sentinel::{synthetic_image, TEST_SENTINEL_PREFIX};

use strategy::{build_strategies, FetchStrategy};

/// Browser-mimicking User-Agent; the image CDN serves 403 to obvious
/// non-browser clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Fetcher settings, projected from [`AppConfig`] so the engine crate
/// stays constructible without a full application config in tests.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Primary image base URL; relative photo paths are joined onto it.
    pub base_url: String,
    /// Alternate CDN bases tried in order after the primary fails.
    pub alt_base_urls: Vec<String>,
    /// Host-header substitutes probed against the primary URL.
    pub host_header_aliases: Vec<String>,
    /// Resolve the origin to an IP at construction and append direct-IP
    /// strategies.
    pub probe_origin_ip: bool,
    pub referer: String,
    pub timeout_secs: u64,
    /// Additional attempts after the first failure of the whole chain.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_image_url.clone(),
            alt_base_urls: config.alt_image_urls.clone(),
            host_header_aliases: config.host_header_aliases.clone(),
            probe_origin_ip: config.probe_origin_ip,
            referer: config.image_referer.clone(),
            timeout_secs: config.fetch_timeout_secs,
            max_retries: config.fetch_max_retries,
            backoff_base_ms: config.fetch_backoff_base_ms,
        }
    }
}

/// Turns a photo reference into raw image bytes by trying an ordered list
/// of strategies — primary base URL, alternate bases, host-header
/// substitution, direct-IP — each attempt classified by HTTP status and
/// content type, the whole chain wrapped in retry with backoff.
///
/// The fetcher never writes to disk and never substitutes placeholders:
/// on exhaustion it reports failure and leaves fallback policy to the
/// caller, which keeps it a pure "get bytes or fail" unit.
pub struct ImageFetcher {
    config: FetcherConfig,
    client: Client,
    /// TLS verification disabled; used only for IP-literal HTTPS attempts
    /// where no certificate can match the URL host.
    insecure_client: Client,
    origin_ip: Option<IpAddr>,
}

impl ImageFetcher {
    /// Creates a fetcher, validating the primary base URL and resolving
    /// the origin IP once when `probe_origin_ip` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidBaseUrl`] for an unparseable base URL
    /// and [`ImageError::Http`] if a client cannot be constructed.
    pub async fn new(config: FetcherConfig) -> Result<Self, ImageError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| ImageError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let insecure_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(true)
            .build()?;

        let origin_ip = if config.probe_origin_ip {
            match origin::host_of(&config.base_url) {
                Some(host) => origin::resolve_origin_ip(&host).await,
                None => None,
            }
        } else {
            None
        };

        Ok(Self {
            config,
            client,
            insecure_client,
            origin_ip,
        })
    }

    /// Fetches raw image bytes for a photo reference.
    ///
    /// References starting with `test:` return a deterministic generated
    /// image without any network traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Exhausted`] when every strategy failed after
    /// all retries, carrying the most retry-relevant underlying failure.
    pub async fn fetch(&self, photo_path: &str) -> Result<Vec<u8>, ImageError> {
        if let Some(name) = photo_path.strip_prefix(TEST_SENTINEL_PREFIX) {
            return synthetic_image(name);
        }
        retry_with_backoff(self.config.max_retries, self.config.backoff_base_ms, || {
            self.try_strategies(photo_path)
        })
        .await
    }

    /// Runs the strategy chain once, returning the first success.
    ///
    /// On exhaustion the reported cause prefers the last *transient*
    /// failure, so the retry wrapper re-runs chains that might recover
    /// and gives up on chains that failed on content (404, non-image
    /// body).
    async fn try_strategies(&self, photo_path: &str) -> Result<Vec<u8>, ImageError> {
        let strategies = build_strategies(&self.config, self.origin_ip, photo_path)?;

        let mut last_err: Option<ImageError> = None;
        let mut last_transient: Option<ImageError> = None;
        for s in strategies {
            match self.attempt(&s).await {
                Ok(bytes) => {
                    tracing::debug!(kind = ?s.kind, url = %s.url, bytes = bytes.len(), "fetched image");
                    return Ok(bytes);
                }
                Err(err) => {
                    tracing::debug!(
                        kind = ?s.kind,
                        url = %s.url,
                        error = %err,
                        "fetch strategy failed — trying next"
                    );
                    if is_retriable(&err) {
                        last_transient = Some(err);
                    } else {
                        last_err = Some(err);
                    }
                }
            }
        }

        let Some(cause) = last_transient.or(last_err) else {
            return Err(ImageError::NotFound {
                url: photo_path.to_owned(),
            });
        };
        Err(ImageError::Exhausted {
            photo_path: photo_path.to_owned(),
            source: Box::new(cause),
        })
    }

    /// One network attempt: send, classify status, check content type,
    /// read the body.
    async fn attempt(&self, strategy: &FetchStrategy) -> Result<Vec<u8>, ImageError> {
        let client = if strategy.insecure {
            &self.insecure_client
        } else {
            &self.client
        };

        let mut request = client
            .get(&strategy.url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .header(header::ACCEPT, IMAGE_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::REFERER, &self.config.referer);
        if let Some(host) = &strategy.host_override {
            request = request.header(header::HOST, host);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ImageError::Transport {
                url: strategy.url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ImageError::NotFound {
                url: strategy.url.clone(),
            });
        }
        if !status.is_success() {
            return Err(ImageError::Blocked {
                url: strategy.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.contains("image") {
            return Err(ImageError::NotAnImage {
                url: strategy.url.clone(),
                content_type,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ImageError::Transport {
                url: strategy.url.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "../fetch_test.rs"]
mod tests;
