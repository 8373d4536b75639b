//! Ordered fetch strategies for one photo reference.
//!
//! Strategies are plain data built up-front from configuration and
//! evaluated in sequence; a failed attempt advances to the next entry
//! instead of unwinding. The exact list is a deployment concern — every
//! entry beyond the primary base URL can be emptied or reordered through
//! config.

use std::net::IpAddr;

use crate::error::ImageError;

use super::FetcherConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrategyKind {
    Primary,
    AlternateBase,
    HostHeader,
    DirectIpHttp,
    DirectIpHttps,
}

/// One way of asking for the image bytes.
#[derive(Debug, Clone)]
pub(crate) struct FetchStrategy {
    pub kind: StrategyKind,
    pub url: String,
    /// Substituted `Host` header; `None` keeps the URL's own host.
    pub host_override: Option<String>,
    /// Use the TLS-verification-disabled client. Only the IP-literal
    /// HTTPS attempt needs it: no certificate matches a bare IP.
    pub insecure: bool,
}

impl FetchStrategy {
    fn direct(kind: StrategyKind, url: String) -> Self {
        Self {
            kind,
            url,
            host_override: None,
            insecure: false,
        }
    }
}

/// Joins a base URL and a relative photo path with exactly one slash.
pub(crate) fn join_base(base: &str, photo_path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        photo_path.trim_start_matches('/')
    )
}

fn is_absolute(photo_path: &str) -> bool {
    photo_path.starts_with("http://") || photo_path.starts_with("https://")
}

/// Builds the ordered strategy list for one photo reference.
///
/// Relative references join the primary base URL, then each alternate
/// base. Absolute references are fetched as-is — the alternates are path
/// joins and do not apply to them. Host-header and direct-IP variants of
/// the primary URL follow when configured.
///
/// # Errors
///
/// Returns [`ImageError::InvalidBaseUrl`] when the composed primary URL
/// does not parse.
pub(crate) fn build_strategies(
    config: &FetcherConfig,
    origin_ip: Option<IpAddr>,
    photo_path: &str,
) -> Result<Vec<FetchStrategy>, ImageError> {
    let primary_url = if is_absolute(photo_path) {
        photo_path.to_owned()
    } else {
        join_base(&config.base_url, photo_path)
    };

    let parsed = reqwest::Url::parse(&primary_url).map_err(|e| ImageError::InvalidBaseUrl {
        url: primary_url.clone(),
        reason: e.to_string(),
    })?;

    let mut strategies = vec![FetchStrategy::direct(
        StrategyKind::Primary,
        primary_url.clone(),
    )];

    if !is_absolute(photo_path) {
        for alt in &config.alt_base_urls {
            strategies.push(FetchStrategy::direct(
                StrategyKind::AlternateBase,
                join_base(alt, photo_path),
            ));
        }
    }

    for alias in &config.host_header_aliases {
        strategies.push(FetchStrategy {
            kind: StrategyKind::HostHeader,
            url: primary_url.clone(),
            host_override: Some(alias.clone()),
            insecure: false,
        });
    }

    if let (Some(ip), Some(host)) = (origin_ip, parsed.host_str()) {
        let ip_literal = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        };
        let mut path_and_query = parsed.path().to_owned();
        if let Some(query) = parsed.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }
        strategies.push(FetchStrategy {
            kind: StrategyKind::DirectIpHttp,
            url: format!("http://{ip_literal}{path_and_query}"),
            host_override: Some(host.to_owned()),
            insecure: false,
        });
        strategies.push(FetchStrategy {
            kind: StrategyKind::DirectIpHttps,
            url: format!("https://{ip_literal}{path_and_query}"),
            host_override: Some(host.to_owned()),
            insecure: true,
        });
    }

    Ok(strategies)
}
