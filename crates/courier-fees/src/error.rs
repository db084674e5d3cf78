use courier_geocode::GeocodeError;
use thiserror::Error;

/// Errors returned by the route client and fee calculator.
#[derive(Debug, Error)]
pub enum FeeError {
    /// One or both endpoints could not be resolved to coordinates.
    /// Surfaced to the UI as-is; never a partial estimate.
    #[error("unable to geocode one or both addresses; check the addresses and try again")]
    AddressResolution,

    /// A geocoding failure other than a clean "not found".
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// No routing API key configured.
    #[error("routing API key is not configured")]
    Configuration,

    /// The routing provider found no route between the points.
    #[error("no route found between the given points")]
    NoRoute,

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing provider returned a non-success status with a message.
    #[error("routing API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
