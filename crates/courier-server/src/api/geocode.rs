use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use courier_geocode::{
    AddressValidationResult, GeocodeOptions, GeocodeResult, HealthStatus, ReverseGeocodeOptions,
    ServiceStats, ValidationOptions,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_geocode_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeRequest {
    pub address: String,
    #[serde(default)]
    pub options: GeocodeOptions,
}

#[derive(Debug, Serialize)]
pub(super) struct GeocodeData {
    /// `null` when the provider found no match for the address.
    pub result: Option<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ReverseGeocodeRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub options: ReverseGeocodeOptions,
}

#[derive(Debug, Deserialize)]
pub(super) struct ValidateRequest {
    pub address: String,
    #[serde(default)]
    pub options: ValidationOptions,
}

pub(super) async fn geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GeocodeRequest>,
) -> Result<Json<ApiResponse<GeocodeData>>, ApiError> {
    let result = state
        .geocoder
        .geocode(&body.address, &body.options)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: GeocodeData { result },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reverse_geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ReverseGeocodeRequest>,
) -> Result<Json<ApiResponse<GeocodeData>>, ApiError> {
    let result = state
        .geocoder
        .reverse_geocode(body.lat, body.lng, &body.options)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: GeocodeData { result },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn validate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<AddressValidationResult>>, ApiError> {
    let result = state
        .geocoder
        .validate_address(&body.address, &body.options)
        .await
        .map_err(|e| map_geocode_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let report = state.geocoder.health_check().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (
        status,
        Json(ApiResponse {
            data: report,
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub(super) async fn stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ServiceStats>> {
    Json(ApiResponse {
        data: state.geocoder.stats().await,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.geocoder.clear_cache().await;
    tracing::info!("geocode cache cleared");
    StatusCode::NO_CONTENT
}
