use crate::{
    entities::shipment::{self, ShipmentStatus},
    entities::shipment_line,
    errors::{ErrorResponse, ServiceError},
    services::shipments::{CreateShipmentCommand, NewShipmentLine, TransitionReceipt},
    ApiResponse, ApiResult, AppState, IdResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShipmentListQuery {
    /// Filter by status (created, picked, in_transit, delivered, cancelled)
    pub status: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShipmentLineRequest {
    pub item_id: Uuid,
    /// Strictly positive
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "shipment_no": "SHP-2025-001",
    "origin_warehouse_id": "7c9a1bb0-3a8f-4a67-9b80-0d9e4c9a2f11",
    "destination_warehouse_id": "b7e6f0a2-51c4-4d5e-8e3a-2f6f1f9f7a21",
    "items": [{"item_id": "550e8400-e29b-41d4-a716-446655440000", "quantity": "5"}]
}))]
pub struct CreateShipmentRequest {
    /// Shipment number
    #[validate(length(min = 1, max = 64))]
    pub shipment_no: String,
    pub origin_warehouse_id: Uuid,
    /// Destination warehouse for internal transfers; omit for external shipments
    pub destination_warehouse_id: Option<Uuid>,
    /// External destination name when no destination warehouse is given
    pub destination_name: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    /// Items and quantities
    #[validate(length(min = 1))]
    pub items: Vec<ShipmentLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"status": "picked"}))]
pub struct UpdateShipmentStatusRequest {
    /// Requested status (created, picked, in_transit, delivered, cancelled)
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentLineResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
}

impl From<shipment_line::Model> for ShipmentLineResponse {
    fn from(model: shipment_line::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentResponse {
    pub id: Uuid,
    pub shipment_no: String,
    pub origin_warehouse_id: Uuid,
    pub destination_warehouse_id: Option<Uuid>,
    pub destination_name: Option<String>,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ShipmentLineResponse>,
}

impl From<(shipment::Model, Vec<shipment_line::Model>)> for ShipmentResponse {
    fn from((model, lines): (shipment::Model, Vec<shipment_line::Model>)) -> Self {
        Self {
            id: model.id,
            shipment_no: model.shipment_no,
            origin_warehouse_id: model.origin_warehouse_id,
            destination_warehouse_id: model.destination_warehouse_id,
            destination_name: model.destination_name,
            status: model.status,
            carrier: model.carrier,
            tracking_number: model.tracking_number,
            shipped_at: model.shipped_at,
            delivered_at: model.delivered_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineMovementResponse {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub movement_id: Uuid,
    pub quantity_on_hand: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub status: ShipmentStatus,
    /// One entry per line whose movement committed
    pub movements: Vec<LineMovementResponse>,
}

impl From<TransitionReceipt> for TransitionResponse {
    fn from(receipt: TransitionReceipt) -> Self {
        Self {
            status: receipt.status,
            movements: receipt
                .applied
                .into_iter()
                .map(|line| LineMovementResponse {
                    line_id: line.line_id,
                    item_id: line.item_id,
                    movement_id: line.movement_id,
                    quantity_on_hand: line.quantity_on_hand,
                })
                .collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment created", body = ApiResponse<IdResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdResponse>>), ServiceError> {
    payload.validate()?;

    let id = state
        .services
        .shipments
        .create_shipment(CreateShipmentCommand {
            shipment_no: payload.shipment_no,
            origin_warehouse_id: payload.origin_warehouse_id,
            destination_warehouse_id: payload.destination_warehouse_id,
            destination_name: payload.destination_name,
            carrier: payload.carrier,
            tracking_number: payload.tracking_number,
            lines: payload
                .items
                .into_iter()
                .map(|line| NewShipmentLine {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect(),
        })
        .await?;

    info!("Shipment created: {}", id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(IdResponse { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments/:id",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses(
        (status = 200, description = "Shipment fetched", body = ApiResponse<ShipmentResponse>),
        (status = 404, description = "Shipment not found", body = ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ShipmentResponse> {
    match state.services.shipments.get_shipment(id).await? {
        Some(found) => Ok(Json(ApiResponse::success(found.into()))),
        None => Err(ServiceError::NotFound(format!("Shipment {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/shipments",
    params(ShipmentListQuery),
    responses(
        (status = 200, description = "Shipments listed, newest first", body = ApiResponse<Vec<shipment::Model>>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    Query(query): Query<ShipmentListQuery>,
) -> ApiResult<Vec<shipment::Model>> {
    let limit = state.config.clamp_limit(query.limit);

    let status = match query.status {
        Some(raw) => Some(ShipmentStatus::from_str(&raw).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown shipment status '{}'", raw))
        })?),
        None => None,
    };

    let shipments = state.services.shipments.list_shipments(status, limit).await?;
    Ok(Json(ApiResponse::success(shipments)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/shipments/:id/status",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    request_body = UpdateShipmentStatusRequest,
    responses(
        (status = 200, description = "Transition applied", body = ApiResponse<TransitionResponse>),
        (status = 400, description = "Unknown status value", body = ErrorResponse),
        (status = 404, description = "Shipment not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed or lost a concurrent race", body = ErrorResponse),
        (status = 500, description = "Transition committed with line failures", body = ErrorResponse)
    ),
    tag = "shipments"
)]
pub async fn update_shipment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentStatusRequest>,
) -> Result<Response, ServiceError> {
    let requested = ShipmentStatus::from_str(&payload.status).map_err(|_| {
        ServiceError::ValidationError(format!("Unknown shipment status '{}'", payload.status))
    })?;

    let receipt = state.services.shipments.update_status(id, requested).await?;

    if receipt.is_partial_failure() {
        warn!(
            "Shipment {} transition to {} applied {} lines, failed {}",
            id,
            receipt.status,
            receipt.applied.len(),
            receipt.failed.len()
        );
        let body = ErrorResponse {
            error: "Internal Server Error".to_string(),
            message: format!(
                "Transition to {} committed, but {} of {} line movements failed; retry the failed lines",
                receipt.status,
                receipt.failed.len(),
                receipt.applied.len() + receipt.failed.len()
            ),
            details: Some(json!({
                "status": receipt.status,
                "applied": receipt.applied,
                "failed": receipt.failed,
            })),
            timestamp: Utc::now().to_rfc3339(),
        };
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }

    info!("Shipment {} transitioned to {}", id, receipt.status);

    Ok(Json(ApiResponse::success(TransitionResponse::from(receipt))).into_response())
}

/// Creates the router for shipment endpoints
pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shipment))
        .route("/", get(list_shipments))
        .route("/:id", get(get_shipment))
        .route("/:id/status", patch(update_shipment_status))
}
