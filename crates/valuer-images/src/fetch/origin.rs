//! Origin host helpers for the image fetcher.

use std::net::IpAddr;

/// Extracts the hostname from a URL for Host-header and DNS use.
pub(crate) fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
}

/// Resolves `host` to a single IP address.
///
/// Called once at fetcher construction. A resolution failure disables the
/// direct-IP strategies for the life of the process instead of erroring —
/// they are a speculative fallback, not a requirement.
pub(crate) async fn resolve_origin_ip(host: &str) -> Option<IpAddr> {
    match tokio::net::lookup_host((host, 443)).await {
        Ok(mut addrs) => {
            let ip = addrs.next().map(|addr| addr.ip());
            match ip {
                Some(ip) => tracing::info!(host, ip = %ip, "resolved image origin"),
                None => tracing::warn!(host, "origin host resolved to no addresses"),
            }
            ip
        }
        Err(e) => {
            tracing::warn!(
                host,
                error = %e,
                "could not resolve origin host — direct-IP strategies disabled"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_extracts_hostname() {
        assert_eq!(
            host_of("https://image.invaluable.com/housePhotos/a/b.jpg").as_deref(),
            Some("image.invaluable.com")
        );
    }

    #[test]
    fn host_of_rejects_garbage() {
        assert_eq!(host_of("not a url"), None);
    }
}
