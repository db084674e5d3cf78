use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a configured value fails to parse.
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
/// Returns `ConfigError` if a configured value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
///
/// Neither API key is required at startup: the service boots without one and
/// reports itself unhealthy until the key is provided.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
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

    let bind_addr = parse_addr("COURIER_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("COURIER_LOG_LEVEL", "info");

    let geocoding_api_key = lookup("COURIER_GEOCODING_API_KEY").ok();
    let routing_api_key = lookup("COURIER_ROUTING_API_KEY").ok();

    let default_language = or_default("COURIER_DEFAULT_LANGUAGE", "en");
    let default_region = or_default("COURIER_DEFAULT_REGION", "US");

    let cache_ttl_secs = parse_u64("COURIER_CACHE_TTL_SECS", "86400")?;
    let rate_limit_per_minute = parse_usize("COURIER_RATE_LIMIT_PER_MINUTE", "50")?;
    let request_timeout_secs = parse_u64("COURIER_REQUEST_TIMEOUT_SECS", "10")?;
    let max_retries = parse_u32("COURIER_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("COURIER_RETRY_BACKOFF_BASE_MS", "1000")?;
    let batch_delay_ms = parse_u64("COURIER_BATCH_DELAY_MS", "100")?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        geocoding_api_key,
        routing_api_key,
        default_language,
        default_region,
        cache_ttl_secs,
        rate_limit_per_minute,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        batch_delay_ms,
    })
}
