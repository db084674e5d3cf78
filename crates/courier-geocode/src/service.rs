//! Geocoding orchestration: cache → rate limiter → provider, plus address
//! validation heuristics, sequential batch geocoding, and health probing.

use std::time::{Duration, Instant};

use courier_core::geo::Coordinate;
use courier_core::AppConfig;
use tokio::sync::Mutex;

use crate::cache::{MemoryCache, ResponseCache};
use crate::error::GeocodeError;
use crate::provider::GeocodeClient;
use crate::ratelimit::SlidingWindow;
use crate::retry::retry_with_backoff;
use crate::types::{
    AddressValidationResult, BatchGeocodingResult, BatchItem, BatchOptions, BatchSummary,
    Confidence, GeocodeOptions, GeocodeResult, HealthReport, HealthStatus, LocationType,
    ReverseGeocodeOptions, ServiceStats, ValidationOptions,
};

/// Known-good address used by the health probe.
const PROBE_ADDRESS: &str = "1600 Amphitheatre Parkway, Mountain View, CA";

/// Tunables for [`GeocodingService`].
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub api_key: Option<String>,
    pub language: String,
    pub region: String,
    pub cache_ttl: Duration,
    pub rate_limit_per_minute: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Fixed pause between batch items, protecting the provider from bursty
    /// batch traffic independently of the rate limiter.
    pub batch_delay: Duration,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language: "en".to_owned(),
            region: "US".to_owned(),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            rate_limit_per_minute: 50,
            request_timeout_secs: 10,
            max_retries: 3,
            retry_backoff_base_ms: 1_000,
            batch_delay: Duration::from_millis(100),
        }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.geocoding_api_key.clone(),
            language: config.default_language.clone(),
            region: config.default_region.clone(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            rate_limit_per_minute: config.rate_limit_per_minute,
            request_timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

/// Wraps the external geocoding provider with caching, rate limiting, retry,
/// and normalization. Construct once at startup and share via `Arc`.
pub struct GeocodingService {
    client: Option<GeocodeClient>,
    config: GeocodingConfig,
    cache: Mutex<Box<dyn ResponseCache>>,
    limiter: Mutex<SlidingWindow>,
}

impl GeocodingService {
    /// Creates a service pointed at the production provider. A missing API
    /// key is not a construction error — calls fail with
    /// [`GeocodeError::Configuration`] and the health check reports unhealthy.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: GeocodingConfig) -> Result<Self, GeocodeError> {
        Self::build(config, None)
    }

    /// Creates a service with a custom provider base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built, or
    /// [`GeocodeError::Api`] if `base_url` is invalid.
    pub fn with_base_url(config: GeocodingConfig, base_url: &str) -> Result<Self, GeocodeError> {
        Self::build(config, Some(base_url))
    }

    fn build(config: GeocodingConfig, base_url: Option<&str>) -> Result<Self, GeocodeError> {
        let client = match &config.api_key {
            Some(key) => Some(match base_url {
                Some(url) => GeocodeClient::with_base_url(key, config.request_timeout_secs, url)?,
                None => GeocodeClient::new(key, config.request_timeout_secs)?,
            }),
            None => None,
        };
        let limiter = SlidingWindow::new(config.rate_limit_per_minute);
        Ok(Self {
            client,
            config,
            cache: Mutex::new(Box::new(MemoryCache::new())),
            limiter: Mutex::new(limiter),
        })
    }

    /// Replaces the in-memory cache with another [`ResponseCache`]
    /// implementation (e.g. a shared store in a multi-process deployment).
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn ResponseCache>) -> Self {
        self.cache = Mutex::new(cache);
        self
    }

    /// Forward-geocodes a free-text address.
    ///
    /// Cache hits short-circuit without consuming rate-limit budget; a slot
    /// is consumed only when a real provider call is made. `Ok(None)` means
    /// the provider found no match — not an error.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Validation`] for an empty address.
    /// - [`GeocodeError::Configuration`] if no API key is configured.
    /// - [`GeocodeError::RateLimited`] when the one-minute budget is spent.
    /// - [`GeocodeError::Http`] / [`GeocodeError::Api`] /
    ///   [`GeocodeError::Deserialize`] from the provider call.
    pub async fn geocode(
        &self,
        address: &str,
        options: &GeocodeOptions,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::Validation(
                "address must not be empty".to_owned(),
            ));
        }
        let client = self.client()?;

        let key = cache_key_forward(trimmed, options);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            tracing::debug!(address = %trimmed, "geocode cache hit");
            return Ok(Some(hit));
        }

        self.acquire_slot().await?;

        let result = retry_with_backoff(
            self.config.max_retries,
            self.config.retry_backoff_base_ms,
            || client.forward(trimmed, options, &self.config.language, &self.config.region),
        )
        .await?;

        if let Some(found) = &result {
            self.cache
                .lock()
                .await
                .set(key, found.clone(), self.config.cache_ttl);
        }
        Ok(result)
    }

    /// Reverse-geocodes a coordinate pair.
    ///
    /// Coordinates are validated here, before any network traffic, rather
    /// than trusting callers to have done it.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`GeocodingService::geocode`];
    /// [`GeocodeError::Validation`] for out-of-range coordinates.
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
        options: &ReverseGeocodeOptions,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        if !Coordinate::new(lat, lng).is_valid() {
            return Err(GeocodeError::Validation(format!(
                "coordinates out of range: ({lat}, {lng})"
            )));
        }
        let client = self.client()?;

        let key = cache_key_reverse(lat, lng, options);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            tracing::debug!(lat, lng, "reverse geocode cache hit");
            return Ok(Some(hit));
        }

        self.acquire_slot().await?;

        let result = retry_with_backoff(
            self.config.max_retries,
            self.config.retry_backoff_base_ms,
            || client.reverse(lat, lng, options, &self.config.language),
        )
        .await?;

        if let Some(found) = &result {
            self.cache
                .lock()
                .await
                .set(key, found.clone(), self.config.cache_ttl);
        }
        Ok(result)
    }

    /// Validates an address against deliverability heuristics.
    ///
    /// Confidence only ever decreases as issues accumulate
    /// (high → medium → low, never back up).
    ///
    /// # Errors
    ///
    /// Propagates geocoding failures; a clean "no match" is not a failure and
    /// yields `is_valid: false`.
    pub async fn validate_address(
        &self,
        address: &str,
        options: &ValidationOptions,
    ) -> Result<AddressValidationResult, GeocodeError> {
        let Some(result) = self.geocode(address, &GeocodeOptions::default()).await? else {
            return Ok(AddressValidationResult {
                is_valid: false,
                is_deliverable: false,
                confidence: Confidence::Low,
                issues: vec!["Address not found".to_owned()],
                geocode: None,
            });
        };

        let mut issues = Vec::new();
        let mut is_deliverable = true;
        let mut confidence = Confidence::High;

        if result.partial_match {
            issues.push("Address is a partial match; verify it is correct".to_owned());
            confidence = confidence.min(Confidence::Medium);
            if options.strict_validation {
                is_deliverable = false;
            }
        }

        if result.geometry.location_type == LocationType::Approximate {
            issues.push("Location is approximate and may not be precise".to_owned());
            confidence = confidence.min(Confidence::Low);
            if !options.allow_approximate_matches {
                is_deliverable = false;
            }
        }

        if !options.required_components.is_empty() {
            let missing: Vec<&str> = options
                .required_components
                .iter()
                .map(String::as_str)
                .filter(|required| !result.has_component_type(required))
                .collect();
            if !missing.is_empty() {
                issues.push(format!(
                    "Missing required address components: {}",
                    missing.join(", ")
                ));
                is_deliverable = false;
            }
        }

        if options.check_deliverability && !result.has_component_type("street_number") {
            issues.push("Address has no street number".to_owned());
            is_deliverable = false;
        }

        if !options.allow_po_boxes
            && result
                .formatted_address
                .to_lowercase()
                .contains("po box")
        {
            issues.push("PO Box addresses are not deliverable".to_owned());
            is_deliverable = false;
        }

        Ok(AddressValidationResult {
            is_valid: true,
            is_deliverable,
            confidence,
            issues,
            geocode: Some(result),
        })
    }

    /// Geocodes a list of addresses one at a time with a fixed pause between
    /// requests. Per-address failures are captured inline and never abort the
    /// batch; the summary always satisfies `total == successful + failed`.
    pub async fn batch_geocode(
        &self,
        addresses: &[String],
        options: &BatchOptions,
    ) -> BatchGeocodingResult {
        let started = Instant::now();
        let mut results = Vec::with_capacity(addresses.len());

        for (index, address) in addresses.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            match self.geocode(address, &GeocodeOptions::default()).await {
                Ok(Some(result)) => {
                    let validation = if options.validate_delivery {
                        // Hits the cache entry just written, so no extra
                        // provider call or rate-limit slot.
                        let validation_options = ValidationOptions {
                            check_deliverability: true,
                            ..ValidationOptions::default()
                        };
                        match self.validate_address(address, &validation_options).await {
                            Ok(validation) => Some(validation),
                            Err(e) => {
                                tracing::warn!(address = %address, error = %e, "batch validation failed");
                                None
                            }
                        }
                    } else {
                        None
                    };
                    results.push(BatchItem {
                        address: address.clone(),
                        success: true,
                        result: Some(result),
                        validation,
                        error: None,
                    });
                }
                Ok(None) => results.push(BatchItem {
                    address: address.clone(),
                    success: false,
                    result: None,
                    validation: None,
                    error: Some("address not found".to_owned()),
                }),
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "batch geocode item failed");
                    results.push(BatchItem {
                        address: address.clone(),
                        success: false,
                        result: None,
                        validation: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let successful = results.iter().filter(|r| r.success).count();
        #[allow(clippy::cast_possible_truncation)]
        let processing_time_ms = started.elapsed().as_millis() as u64;
        BatchGeocodingResult {
            summary: BatchSummary {
                total: addresses.len(),
                successful,
                failed: addresses.len() - successful,
                processing_time_ms,
            },
            results,
        }
    }

    /// Probes the provider with a known-good address.
    ///
    /// `unhealthy` when no API key is configured, `healthy` when the probe
    /// succeeds, `degraded` when the key is present but the probe failed.
    pub async fn health_check(&self) -> HealthReport {
        let rate_limit_remaining = self.limiter.lock().await.remaining();
        if self.client.is_none() {
            return HealthReport {
                status: HealthStatus::Unhealthy,
                api_key_configured: false,
                cache_enabled: true,
                rate_limit_remaining,
                last_error: None,
            };
        }

        match self.geocode(PROBE_ADDRESS, &GeocodeOptions::default()).await {
            Ok(_) => HealthReport {
                status: HealthStatus::Healthy,
                api_key_configured: true,
                cache_enabled: true,
                rate_limit_remaining: self.limiter.lock().await.remaining(),
                last_error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed");
                HealthReport {
                    status: HealthStatus::Degraded,
                    api_key_configured: true,
                    cache_enabled: true,
                    rate_limit_remaining: self.limiter.lock().await.remaining(),
                    last_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Drops all cached results unconditionally.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Point-in-time cache and rate-limit numbers; no side effects.
    pub async fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache_size: self.cache.lock().await.len(),
            remaining_requests: self.limiter.lock().await.remaining(),
            rate_limit_per_minute: self.config.rate_limit_per_minute,
        }
    }

    fn client(&self) -> Result<&GeocodeClient, GeocodeError> {
        self.client.as_ref().ok_or(GeocodeError::Configuration)
    }

    async fn acquire_slot(&self) -> Result<(), GeocodeError> {
        let mut limiter = self.limiter.lock().await;
        if limiter.try_acquire() {
            Ok(())
        } else {
            let retry_after_secs = limiter.retry_after().as_secs().max(1);
            Err(GeocodeError::RateLimited { retry_after_secs })
        }
    }
}

/// Cache key for a forward geocode: normalized address plus every option
/// that changes the provider response.
fn cache_key_forward(address: &str, options: &GeocodeOptions) -> String {
    let mut key = format!("geocode:{}", address.to_lowercase());
    if let Some(language) = &options.language {
        key.push_str(&format!("|lang={language}"));
    }
    if let Some(region) = &options.region {
        key.push_str(&format!("|region={region}"));
    }
    if let Some(bounds) = &options.bounds {
        key.push_str(&format!(
            "|bounds={:.6},{:.6},{:.6},{:.6}",
            bounds.southwest.lat, bounds.southwest.lng, bounds.northeast.lat, bounds.northeast.lng
        ));
    }
    if let Some(filter) = &options.components {
        key.push_str(&format!(
            "|components={},{},{}",
            filter.country.as_deref().unwrap_or(""),
            filter.postal_code.as_deref().unwrap_or(""),
            filter.locality.as_deref().unwrap_or("")
        ));
    }
    key
}

/// Cache key for a reverse geocode: coordinates rounded to six decimals
/// (~10 cm) plus the result filters.
fn cache_key_reverse(lat: f64, lng: f64, options: &ReverseGeocodeOptions) -> String {
    let mut key = format!("reverse:{lat:.6},{lng:.6}");
    if let Some(language) = &options.language {
        key.push_str(&format!("|lang={language}"));
    }
    if !options.result_types.is_empty() {
        key.push_str(&format!("|result_types={}", options.result_types.join("|")));
    }
    if !options.location_types.is_empty() {
        key.push_str(&format!(
            "|location_types={}",
            options.location_types.join("|")
        ));
    }
    key
}
