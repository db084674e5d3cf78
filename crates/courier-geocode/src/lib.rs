//! Geocoding service: forward/reverse geocoding, address validation, and
//! batch geocoding against an external geocoding provider, with a TTL result
//! cache, a sliding one-minute rate limiter, and retry with back-off.

mod cache;
mod error;
mod provider;
mod ratelimit;
mod retry;
mod service;
mod types;
mod wire;

pub use cache::{MemoryCache, ResponseCache};
pub use error::GeocodeError;
pub use provider::GeocodeClient;
pub use ratelimit::SlidingWindow;
pub use service::{GeocodingConfig, GeocodingService};
pub use types::{
    AddressComponent, AddressValidationResult, BatchGeocodingResult, BatchItem, BatchOptions,
    BatchSummary, ComponentFilter, Confidence, GeocodeOptions, GeocodeResult, Geometry,
    HealthReport, HealthStatus, LocationType, ReverseGeocodeOptions, ServiceStats,
    ValidationOptions, Viewport,
};
