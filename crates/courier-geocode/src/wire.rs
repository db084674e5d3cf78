//! Provider wire format for the geocoding REST API.
//!
//! The provider wraps every response in a `{"status": "OK", "results": [...]}`
//! envelope; [`GeocodeEnvelope`] captures that pattern. Wire shapes are
//! converted into the normalized [`GeocodeResult`] before leaving this crate.

use courier_core::geo::Coordinate;
use serde::Deserialize;

use crate::types::{AddressComponent, GeocodeResult, Geometry, LocationType, Viewport};

/// Top-level envelope for all geocoding API responses.
///
/// `status` is `"OK"` on success, `"ZERO_RESULTS"` when nothing matched,
/// or an error code accompanied by `error_message`.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeEnvelope {
    pub status: String,
    #[serde(default)]
    pub results: Vec<WireResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResult {
    pub formatted_address: String,
    pub geometry: WireGeometry,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub partial_match: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGeometry {
    pub location: WireLatLng,
    pub location_type: LocationType,
    #[serde(default)]
    pub viewport: Option<WireViewport>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireViewport {
    pub northeast: WireLatLng,
    pub southwest: WireLatLng,
}

impl From<WireLatLng> for Coordinate {
    fn from(value: WireLatLng) -> Self {
        Self::new(value.lat, value.lng)
    }
}

impl WireResult {
    pub(crate) fn into_normalized(self) -> GeocodeResult {
        GeocodeResult {
            formatted_address: self.formatted_address,
            geometry: Geometry {
                location: self.geometry.location.into(),
                location_type: self.geometry.location_type,
                viewport: self.geometry.viewport.map(|v| Viewport {
                    northeast: v.northeast.into(),
                    southwest: v.southwest.into(),
                }),
            },
            place_id: self.place_id,
            types: self.types,
            address_components: self.address_components,
            partial_match: self.partial_match,
        }
    }
}
