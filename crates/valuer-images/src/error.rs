use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    /// HTTP client construction or other request-machinery failure not tied
    /// to a single attempt URL.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Network-level failure for one attempt: timeout, connection reset,
    /// body read error.
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image not found: {url}")]
    NotFound { url: String },

    /// Non-2xx response other than 404 — typically 403 from the CDN's
    /// bot filtering, or a transient 5xx.
    #[error("blocked with HTTP {status} at {url}")]
    Blocked { url: String, status: u16 },

    /// 2xx response whose body is not an image (an HTML block page, a
    /// JSON error). Advances to the next strategy instead of retrying.
    #[error("response from {url} is not an image (content-type \"{content_type}\")")]
    NotAnImage { url: String, content_type: String },

    /// Every fetch strategy failed. `source` is the most retry-relevant
    /// failure observed: the last transient error when any attempt was
    /// transient, otherwise the last error seen.
    #[error("all fetch strategies exhausted for {photo_path}")]
    Exhausted {
        photo_path: String,
        #[source]
        source: Box<ImageError>,
    },

    /// Bytes that do not decode as an image, or a re-encode failure.
    #[error("image codec error: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("storage error at {path}: {reason}")]
    Storage { path: String, reason: String },

    #[error("invalid image base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ImageError {
    /// Shorthand for backend I/O failures whose concrete error types
    /// (std::io, S3) differ per store variant.
    pub(crate) fn storage(path: &str, err: impl std::fmt::Display) -> Self {
        ImageError::Storage {
            path: path.to_owned(),
            reason: err.to_string(),
        }
    }
}
