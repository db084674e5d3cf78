use axum::{extract::State, Extension, Json};
use courier_fees::{estimated_delivery_time, DeliveryEstimate, Priority};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_fee_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DeliveryFeeRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub priority: Priority,
    pub order_total: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeliveryFeeData {
    #[serde(flatten)]
    pub estimate: DeliveryEstimate,
    /// Human-readable pickup-to-door estimate, e.g. `"25 minutes"`.
    pub estimated_delivery_time: String,
}

pub(super) async fn delivery_fee(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DeliveryFeeRequest>,
) -> Result<Json<ApiResponse<DeliveryFeeData>>, ApiError> {
    let estimate = state
        .fees
        .calculate_delivery_fee(
            &body.origin,
            &body.destination,
            body.priority,
            body.order_total,
        )
        .await
        .map_err(|e| map_fee_error(req_id.0.clone(), &e))?;

    let estimated_delivery_time = estimated_delivery_time(estimate.duration.value, body.priority);
    Ok(Json(ApiResponse {
        data: DeliveryFeeData {
            estimate,
            estimated_delivery_time,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
