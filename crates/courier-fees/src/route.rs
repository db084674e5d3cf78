//! HTTP client for the routing provider's directions API.
//!
//! Same envelope discipline as the geocoding client: the provider wraps the
//! response in a `"status"` envelope, and the first route's first leg carries
//! the distance, duration, and encoded polyline we care about.

use std::time::Duration;

use courier_core::geo::Coordinate;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::FeeError;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// A quantity with both the provider's display string and the raw value
/// (meters for distance, seconds for duration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: i64,
}

/// Distance, duration, and opaque encoded path for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub distance: TextValue,
    pub duration: TextValue,
    /// Encoded polyline, passed through unmodified.
    pub polyline: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsEnvelope {
    status: String,
    #[serde(default)]
    routes: Vec<WireRoute>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    legs: Vec<WireLeg>,
    overview_polyline: WirePolyline,
}

#[derive(Debug, Deserialize)]
struct WireLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Debug, Deserialize)]
struct WirePolyline {
    points: String,
}

/// Client for the routing REST API.
pub struct RouteClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl RouteClient {
    /// Creates a new client pointed at the production routing API.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, FeeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`FeeError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, FeeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("courier/0.1 (delivery-estimation)")
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| FeeError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Requests a driving route between two coordinates.
    ///
    /// # Errors
    ///
    /// - [`FeeError::Configuration`] when no API key is configured.
    /// - [`FeeError::NoRoute`] when the provider returns no routes.
    /// - [`FeeError::Api`] on an error status from the provider.
    /// - [`FeeError::Http`] on network failure or non-2xx HTTP status.
    /// - [`FeeError::Deserialize`] if the response shape is unexpected.
    pub async fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteInfo, FeeError> {
        if self.api_key.is_empty() {
            return Err(FeeError::Configuration);
        }

        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            pairs.append_pair("origin", &format!("{},{}", origin.lat, origin.lng));
            pairs.append_pair(
                "destination",
                &format!("{},{}", destination.lat, destination.lng),
            );
        }

        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        let envelope: DirectionsEnvelope =
            serde_json::from_str(&body).map_err(|e| FeeError::Deserialize {
                context: url.path().to_string(),
                source: e,
            })?;

        match envelope.status.as_str() {
            "OK" => {
                let route = envelope.routes.into_iter().next().ok_or(FeeError::NoRoute)?;
                let leg = route.legs.into_iter().next().ok_or(FeeError::NoRoute)?;
                Ok(RouteInfo {
                    distance: leg.distance,
                    duration: leg.duration,
                    polyline: route.overview_polyline.points,
                })
            }
            "ZERO_RESULTS" => Err(FeeError::NoRoute),
            other => {
                let message = envelope
                    .error_message
                    .unwrap_or_else(|| "no error message".to_string());
                Err(FeeError::Api(format!("{other}: {message}")))
            }
        }
    }
}
