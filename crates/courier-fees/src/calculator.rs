//! Pricing model and fee calculator.
//!
//! [`price_route`] is the pure pricing function; [`FeeCalculator`] wires it
//! to the geocoding service and the routing client.

use std::sync::Arc;

use courier_geocode::{GeocodeOptions, GeocodingService};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::FeeError;
use crate::route::{RouteClient, RouteInfo, TextValue};

const METERS_PER_MILE: f64 = 1609.34;

/// Requested delivery speed tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Standard,
    Express,
    Rush,
}

impl Priority {
    /// Pricing scalar applied to the fee subtotal.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Express => 1.5,
            Self::Rush => 2.0,
        }
    }

    /// Kitchen prep time added to the travel estimate, in minutes.
    #[must_use]
    pub fn prep_time_minutes(self) -> i64 {
        match self {
            Self::Standard => 15,
            Self::Express => 10,
            Self::Rush => 5,
        }
    }
}

/// Pricing model knobs. Defaults match the production fee schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeOptions {
    pub base_fee: f64,
    pub per_mile_rate: f64,
    pub per_minute_rate: f64,
    pub minimum_fee: f64,
    pub maximum_fee: f64,
    pub free_delivery_threshold: f64,
}

impl Default for FeeOptions {
    fn default() -> Self {
        Self {
            base_fee: 5.99,
            per_mile_rate: 1.50,
            per_minute_rate: 0.10,
            minimum_fee: 3.99,
            maximum_fee: 50.00,
            free_delivery_threshold: 35.00,
        }
    }
}

/// Partial override of [`FeeOptions`]; unset fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeOptionsPatch {
    pub base_fee: Option<f64>,
    pub per_mile_rate: Option<f64>,
    pub per_minute_rate: Option<f64>,
    pub minimum_fee: Option<f64>,
    pub maximum_fee: Option<f64>,
    pub free_delivery_threshold: Option<f64>,
}

impl FeeOptions {
    fn apply(&mut self, patch: FeeOptionsPatch) {
        if let Some(v) = patch.base_fee {
            self.base_fee = v;
        }
        if let Some(v) = patch.per_mile_rate {
            self.per_mile_rate = v;
        }
        if let Some(v) = patch.per_minute_rate {
            self.per_minute_rate = v;
        }
        if let Some(v) = patch.minimum_fee {
            self.minimum_fee = v;
        }
        if let Some(v) = patch.maximum_fee {
            self.maximum_fee = v;
        }
        if let Some(v) = patch.free_delivery_threshold {
            self.free_delivery_threshold = v;
        }
    }
}

/// Fee breakdown for one delivery. Derived, never persisted.
///
/// `priority_fee` is the surcharge portion of `total_fee`
/// (`subtotal × (multiplier − 1)`), reported separately for the UI
/// breakdown — it is already included in `total_fee`, never added on top.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryEstimate {
    pub distance: TextValue,
    pub duration: TextValue,
    pub base_fee: f64,
    pub distance_fee: f64,
    pub time_fee: f64,
    pub priority_fee: f64,
    pub total_fee: f64,
    pub is_free_delivery: bool,
    /// Encoded polyline of the route.
    pub route: String,
}

/// Rounds a currency amount to the cent, half away from zero.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Applies the pricing model to a resolved route.
///
/// Clamps the total into `[minimum_fee, maximum_fee]`, then applies the
/// free-delivery override (inclusive threshold), which forces the total to
/// zero regardless of the clamp.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn price_route(
    route: &RouteInfo,
    priority: Priority,
    order_total: Option<f64>,
    options: &FeeOptions,
) -> DeliveryEstimate {
    let distance_miles = route.distance.value as f64 / METERS_PER_MILE;
    let duration_minutes = route.duration.value as f64 / 60.0;

    let base_fee = options.base_fee;
    let distance_fee = distance_miles * options.per_mile_rate;
    let time_fee = duration_minutes * options.per_minute_rate;
    let subtotal = base_fee + distance_fee + time_fee;

    let multiplier = priority.multiplier();
    let priority_fee = subtotal * (multiplier - 1.0);
    let mut total_fee = (subtotal * multiplier).clamp(options.minimum_fee, options.maximum_fee);

    let is_free_delivery =
        order_total.is_some_and(|total| total >= options.free_delivery_threshold);
    if is_free_delivery {
        total_fee = 0.0;
    }

    DeliveryEstimate {
        distance: route.distance.clone(),
        duration: route.duration.clone(),
        base_fee: round_cents(base_fee),
        distance_fee: round_cents(distance_fee),
        time_fee: round_cents(time_fee),
        priority_fee: round_cents(priority_fee),
        total_fee: round_cents(total_fee),
        is_free_delivery,
        route: route.polyline.clone(),
    }
}

/// Human-readable pickup-to-door estimate: travel time (rounded up to whole
/// minutes) plus the tier's prep time. `"N minutes"` under an hour,
/// otherwise `"Hh Mm"` with the minutes omitted when zero.
#[must_use]
pub fn estimated_delivery_time(duration_secs: i64, priority: Priority) -> String {
    let travel_minutes = duration_secs.div_euclid(60) + i64::from(duration_secs % 60 != 0);
    let total_minutes = travel_minutes + priority.prep_time_minutes();
    if total_minutes < 60 {
        return format!("{total_minutes} minutes");
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if minutes == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {minutes}m")
    }
}

/// Estimates delivery fees between two addresses. Construct once at startup
/// and share via `Arc`; options can be re-tuned at runtime.
pub struct FeeCalculator {
    geocoder: Arc<GeocodingService>,
    router: RouteClient,
    options: Mutex<FeeOptions>,
}

impl FeeCalculator {
    #[must_use]
    pub fn new(geocoder: Arc<GeocodingService>, router: RouteClient) -> Self {
        Self::with_options(geocoder, router, FeeOptions::default())
    }

    #[must_use]
    pub fn with_options(
        geocoder: Arc<GeocodingService>,
        router: RouteClient,
        options: FeeOptions,
    ) -> Self {
        Self {
            geocoder,
            router,
            options: Mutex::new(options),
        }
    }

    /// Produces a [`DeliveryEstimate`] between two free-text addresses.
    ///
    /// Both endpoints are geocoded concurrently — there is no ordering
    /// dependency, but both must resolve.
    ///
    /// # Errors
    ///
    /// - [`FeeError::AddressResolution`] if either address has no match.
    /// - [`FeeError::Geocode`] for any other geocoding failure.
    /// - [`FeeError::Configuration`] if no routing API key is configured.
    /// - [`FeeError::NoRoute`] / [`FeeError::Api`] / [`FeeError::Http`] from
    ///   the routing call.
    pub async fn calculate_delivery_fee(
        &self,
        origin_address: &str,
        destination_address: &str,
        priority: Priority,
        order_total: Option<f64>,
    ) -> Result<DeliveryEstimate, FeeError> {
        let options = GeocodeOptions::default();
        let (origin, destination) = tokio::join!(
            self.geocoder.geocode(origin_address, &options),
            self.geocoder.geocode(destination_address, &options),
        );
        let (Some(origin), Some(destination)) = (origin?, destination?) else {
            return Err(FeeError::AddressResolution);
        };

        let route = self
            .router
            .calculate_route(origin.geometry.location, destination.geometry.location)
            .await?;
        tracing::debug!(
            distance_m = route.distance.value,
            duration_s = route.duration.value,
            "route resolved for fee estimate"
        );

        let options = self.options.lock().await.clone();
        Ok(price_route(&route, priority, order_total, &options))
    }

    /// Shallow-merges a partial override into the current pricing options.
    pub async fn update_options(&self, patch: FeeOptionsPatch) {
        self.options.lock().await.apply(patch);
    }

    /// Defensive copy of the current pricing options.
    pub async fn options(&self) -> FeeOptions {
        self.options.lock().await.clone()
    }
}
