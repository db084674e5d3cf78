//! HTTP client for the geocoding provider's REST API.
//!
//! Wraps `reqwest` with provider-specific error handling, API key management,
//! and typed response deserialization. Every response carries a `"status"`
//! field in the JSON envelope; non-success statuses other than
//! `"ZERO_RESULTS"` surface as [`GeocodeError::Api`].

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::types::{ComponentFilter, GeocodeOptions, GeocodeResult, ReverseGeocodeOptions, Viewport};
use crate::wire::GeocodeEnvelope;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Client for the geocoding REST API.
///
/// Manages the HTTP client, API key, and base URL. Use [`GeocodeClient::new`]
/// for production or [`GeocodeClient::with_base_url`] to point at a mock
/// server in tests.
pub struct GeocodeClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl GeocodeClient {
    /// Creates a new client pointed at the production geocoding API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("courier/0.1 (delivery-estimation)")
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| GeocodeError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Forward-geocodes a free-text address.
    ///
    /// Applies the provider's language/region parameters (options falling
    /// back to the supplied defaults), optional bounding box, and component
    /// restrictions. `ZERO_RESULTS` maps to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Api`] if the API returns an error status.
    /// - [`GeocodeError::Http`] on network failure or non-2xx HTTP status.
    /// - [`GeocodeError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn forward(
        &self,
        address: &str,
        options: &GeocodeOptions,
        default_language: &str,
        default_region: &str,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        let language = options.language.as_deref().unwrap_or(default_language);
        let region = options.region.as_deref().unwrap_or(default_region);

        let mut params = vec![
            ("address", address.to_owned()),
            ("language", language.to_owned()),
            ("region", region.to_owned()),
        ];
        if let Some(bounds) = &options.bounds {
            params.push(("bounds", bounds_param(bounds)));
        }
        if let Some(filter) = &options.components {
            if let Some(components) = components_param(filter) {
                params.push(("components", components));
            }
        }

        let url = self.build_url(&params);
        let body = self.request_json(&url).await?;
        parse_envelope(body, &format!("geocode(address={address})"))
    }

    /// Reverse-geocodes a coordinate pair into a structured address.
    ///
    /// `result_types` and `location_types` filters are joined with `|` per
    /// the provider's syntax. `ZERO_RESULTS` maps to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Api`] if the API returns an error status.
    /// - [`GeocodeError::Http`] on network failure or non-2xx HTTP status.
    /// - [`GeocodeError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn reverse(
        &self,
        lat: f64,
        lng: f64,
        options: &ReverseGeocodeOptions,
        default_language: &str,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        let language = options.language.as_deref().unwrap_or(default_language);

        let mut params = vec![
            ("latlng", format!("{lat},{lng}")),
            ("language", language.to_owned()),
        ];
        if !options.result_types.is_empty() {
            params.push(("result_type", options.result_types.join("|")));
        }
        if !options.location_types.is_empty() {
            params.push(("location_type", options.location_types.join("|")));
        }

        let url = self.build_url(&params);
        let body = self.request_json(&url).await?;
        parse_envelope(body, &format!("reverse_geocode(latlng={lat},{lng})"))
    }

    /// Builds the full request URL with properly percent-encoded query parameters.
    fn build_url(&self, params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request, asserts a 2xx HTTP status, and parses the response
    /// body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] on network failure or a non-2xx status.
    /// Returns [`GeocodeError::Deserialize`] if the body is not valid JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, GeocodeError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }
}

/// Checks the envelope `"status"` and normalizes the first result.
///
/// `ZERO_RESULTS` (and an empty result list) map to `Ok(None)` — "not found"
/// is not an error.
fn parse_envelope(
    body: serde_json::Value,
    context: &str,
) -> Result<Option<GeocodeResult>, GeocodeError> {
    let envelope: GeocodeEnvelope =
        serde_json::from_value(body).map_err(|e| GeocodeError::Deserialize {
            context: context.to_string(),
            source: e,
        })?;

    match envelope.status.as_str() {
        "OK" => Ok(envelope
            .results
            .into_iter()
            .next()
            .map(crate::wire::WireResult::into_normalized)),
        "ZERO_RESULTS" => Ok(None),
        other => {
            let message = envelope
                .error_message
                .unwrap_or_else(|| "no error message".to_string());
            Err(GeocodeError::Api(format!("{other}: {message}")))
        }
    }
}

/// Joins component restrictions into the provider's
/// `country:US|postal_code:94043|locality:Mountain View` syntax.
fn components_param(filter: &ComponentFilter) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(country) = &filter.country {
        parts.push(format!("country:{country}"));
    }
    if let Some(postal_code) = &filter.postal_code {
        parts.push(format!("postal_code:{postal_code}"));
    }
    if let Some(locality) = &filter.locality {
        parts.push(format!("locality:{locality}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

/// Formats a bounding box as `south,west|north,east` for the `bounds` param.
fn bounds_param(bounds: &Viewport) -> String {
    format!(
        "{},{}|{},{}",
        bounds.southwest.lat, bounds.southwest.lng, bounds.northeast.lat, bounds.northeast.lng
    )
}
