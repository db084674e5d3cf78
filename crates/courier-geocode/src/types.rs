//! Normalized geocoding result types and request options.
//!
//! These are the shapes the service hands to callers — the provider's wire
//! format lives in `wire.rs` and is converted on the way in.

use courier_core::geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Provider confidence in the precision of a geocoded location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
}

/// Bounding box returned alongside some results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub northeast: Coordinate,
    pub southwest: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: Coordinate,
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

/// One structured component of an address (street number, locality, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

/// Normalized geocoding response, served fresh or from cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: Geometry,
    pub place_id: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub partial_match: bool,
}

impl GeocodeResult {
    /// Whether any address component carries the given type tag.
    #[must_use]
    pub fn has_component_type(&self, component_type: &str) -> bool {
        self.address_components
            .iter()
            .any(|c| c.types.iter().any(|t| t == component_type))
    }
}

// ---------------------------------------------------------------------------
// Address validation
// ---------------------------------------------------------------------------

/// Validation confidence. Ordered so that `min` always downgrades:
/// `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressValidationResult {
    pub is_valid: bool,
    pub is_deliverable: bool,
    pub confidence: Confidence,
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode: Option<GeocodeResult>,
}

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// Options for a forward geocode. Language and region fall back to the
/// service-wide defaults when unset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocodeOptions {
    pub language: Option<String>,
    pub region: Option<String>,
    pub bounds: Option<Viewport>,
    pub components: Option<ComponentFilter>,
}

/// Component restrictions, joined into the provider's
/// `country:US|locality:Mountain View` syntax.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentFilter {
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub locality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReverseGeocodeOptions {
    pub language: Option<String>,
    /// Restrict results to these place types, joined with `|`.
    #[serde(default)]
    pub result_types: Vec<String>,
    /// Restrict results to these location types, joined with `|`.
    #[serde(default)]
    pub location_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationOptions {
    /// Treat partial matches as undeliverable.
    #[serde(default)]
    pub strict_validation: bool,
    /// Accept `APPROXIMATE` locations as deliverable.
    #[serde(default)]
    pub allow_approximate_matches: bool,
    /// Accept PO Box addresses as deliverable.
    #[serde(default)]
    pub allow_po_boxes: bool,
    /// Require a `street_number` component.
    #[serde(default)]
    pub check_deliverability: bool,
    /// Component types that must be present for the address to be deliverable.
    #[serde(default)]
    pub required_components: Vec<String>,
}

// ---------------------------------------------------------------------------
// Batch geocoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchOptions {
    /// Run address validation on each successfully geocoded address.
    #[serde(default)]
    pub validate_delivery: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub address: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GeocodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<AddressValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchGeocodingResult {
    pub results: Vec<BatchItem>,
    pub summary: BatchSummary,
}

// ---------------------------------------------------------------------------
// Service introspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceStats {
    pub cache_size: usize,
    pub remaining_requests: usize,
    pub rate_limit_per_minute: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub api_key_configured: bool,
    pub cache_enabled: bool,
    pub rate_limit_remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
