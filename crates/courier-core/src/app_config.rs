use std::net::SocketAddr;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub geocoding_api_key: Option<String>,
    pub routing_api_key: Option<String>,
    pub default_language: String,
    pub default_region: String,
    pub cache_ttl_secs: u64,
    pub rate_limit_per_minute: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub batch_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "geocoding_api_key",
                &self.geocoding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "routing_api_key",
                &self.routing_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("default_language", &self.default_language)
            .field("default_region", &self.default_region)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .finish()
    }
}
