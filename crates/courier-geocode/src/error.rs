use thiserror::Error;

/// Errors returned by the geocoding service and provider client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// No geocoding API key configured; fatal for the call, never retried.
    #[error("geocoding API key is not configured")]
    Configuration,

    /// Malformed input (empty address, out-of-range coordinates); fails fast.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Local sliding-window budget exhausted; no network call was made.
    #[error("rate limit exceeded; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status with a message.
    #[error("geocoding API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
