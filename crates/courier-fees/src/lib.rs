//! Delivery-fee estimation: routes between two geocoded points priced by a
//! configurable model (base fee, per-mile, per-minute, priority multiplier,
//! min/max clamps, free-delivery threshold).

mod calculator;
mod error;
mod route;

pub use calculator::{
    estimated_delivery_time, price_route, DeliveryEstimate, FeeCalculator, FeeOptions,
    FeeOptionsPatch, Priority,
};
pub use error::FeeError;
pub use route::{RouteClient, RouteInfo, TextValue};
