mod fees;
mod geocode;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use courier_fees::{FeeCalculator, FeeError};
use courier_geocode::{GeocodeError, GeocodingService};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub geocoder: Arc<GeocodingService>,
    pub fees: Arc<FeeCalculator>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
    #[serde(skip)]
    retry_after: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
            retry_after: None,
        }
    }

    #[must_use]
    fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "unprocessable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let retry_after = self.retry_after;
        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(val) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, val);
            }
        }
        response
    }
}

pub(super) fn map_geocode_error(request_id: String, error: &GeocodeError) -> ApiError {
    match error {
        GeocodeError::Validation(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        GeocodeError::RateLimited { retry_after_secs } => {
            ApiError::new(request_id, "rate_limited", error.to_string())
                .with_retry_after(*retry_after_secs)
        }
        GeocodeError::Configuration => ApiError::new(
            request_id,
            "not_configured",
            "geocoding API key is not configured",
        ),
        GeocodeError::Http(_) | GeocodeError::Api(_) | GeocodeError::Deserialize { .. } => {
            tracing::error!(error = %error, "geocoding provider call failed");
            ApiError::new(request_id, "upstream_error", "geocoding provider failed")
        }
    }
}

pub(super) fn map_fee_error(request_id: String, error: &FeeError) -> ApiError {
    match error {
        FeeError::AddressResolution | FeeError::NoRoute => {
            ApiError::new(request_id, "unprocessable", error.to_string())
        }
        FeeError::Geocode(inner) => map_geocode_error(request_id, inner),
        FeeError::Configuration => ApiError::new(
            request_id,
            "not_configured",
            "routing API key is not configured",
        ),
        FeeError::Http(_) | FeeError::Api(_) | FeeError::Deserialize { .. } => {
            tracing::error!(error = %error, "routing provider call failed");
            ApiError::new(request_id, "upstream_error", "routing provider failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/geocode", post(geocode::geocode))
        .route("/api/v1/reverse-geocode", post(geocode::reverse_geocode))
        .route("/api/v1/validate", post(geocode::validate))
        .route("/api/v1/delivery-fee", post(fees::delivery_fee))
        .route("/api/v1/health", get(geocode::health))
        .route("/api/v1/stats", get(geocode::stats))
        .route("/api/v1/clear-cache", post(geocode::clear_cache))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}
