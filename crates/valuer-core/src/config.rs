use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default alternate CDN bases probed after the primary image host fails.
const DEFAULT_ALT_IMAGE_URLS: &str = "https://media.invaluable.com/housePhotos/,https://www.invaluable.com/housePhotos/,https://cdn.invaluable.com/housePhotos/";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "t" => Ok(true),
                "false" | "0" | "f" => Ok(false),
                _ => Err(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: format!("expected a boolean, got \"{raw}\""),
                }),
            },
        }
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    // Comma-separated list; empty entries are dropped so a trailing comma
    // or an explicitly empty var both mean "no entries".
    let parse_list = |var: &str, default: &str| -> Vec<String> {
        or_default(var, default)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    };

    let env = parse_environment(&or_default("VALUER_ENV", "development"));
    let log_level = or_default("VALUER_LOG_LEVEL", "info");

    let use_remote_storage = parse_bool("VALUER_USE_REMOTE_STORAGE", false)?;
    let storage_bucket = lookup("VALUER_STORAGE_BUCKET").ok();
    if use_remote_storage && storage_bucket.is_none() {
        return Err(ConfigError::MissingEnvVar(
            "VALUER_STORAGE_BUCKET".to_string(),
        ));
    }
    let storage_region = or_default("VALUER_STORAGE_REGION", "us-east-1");
    let storage_endpoint = lookup("VALUER_STORAGE_ENDPOINT").ok();
    let storage_public_base_url = lookup("VALUER_STORAGE_PUBLIC_BASE_URL")
        .ok()
        .map(|u| u.trim_end_matches('/').to_string());
    let local_storage_path = PathBuf::from(or_default("VALUER_LOCAL_STORAGE_PATH", "./local_images"));

    let base_image_url = or_default(
        "VALUER_BASE_IMAGE_URL",
        "https://image.invaluable.com/housePhotos/",
    );
    let alt_image_urls = parse_list("VALUER_ALT_IMAGE_URLS", DEFAULT_ALT_IMAGE_URLS);
    let host_header_aliases = parse_list("VALUER_HOST_HEADER_ALIASES", "");
    let probe_origin_ip = parse_bool("VALUER_PROBE_ORIGIN_IP", false)?;
    let image_referer = or_default("VALUER_IMAGE_REFERER", "https://www.invaluable.com/");

    let optimize_images = parse_bool("VALUER_OPTIMIZE_IMAGES", true)?;
    let max_image_dimension = parse_u32("VALUER_MAX_IMAGE_DIMENSION", "1200")?;
    let image_batch_size = parse_usize("VALUER_IMAGE_BATCH_SIZE", "10")?;
    let fetch_timeout_secs = parse_u64("VALUER_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_max_retries = parse_u32("VALUER_FETCH_MAX_RETRIES", "2")?;
    let fetch_backoff_base_ms = parse_u64("VALUER_FETCH_BACKOFF_BASE_MS", "2000")?;

    Ok(AppConfig {
        env,
        log_level,
        use_remote_storage,
        storage_bucket,
        storage_region,
        storage_endpoint,
        storage_public_base_url,
        local_storage_path,
        base_image_url,
        alt_image_urls,
        host_header_aliases,
        probe_origin_ip,
        image_referer,
        optimize_images,
        max_image_dimension,
        image_batch_size,
        fetch_timeout_secs,
        fetch_max_retries,
        fetch_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
