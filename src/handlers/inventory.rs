use crate::{
    entities::stock_level,
    entities::stock_movement::{self, MovementType},
    errors::ServiceError,
    services::inventory::{MovementReceipt, RecordMovementCommand},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "type": "in",
    "warehouse_id": "7c9a1bb0-3a8f-4a67-9b80-0d9e4c9a2f11",
    "item_id": "550e8400-e29b-41d4-a716-446655440000",
    "quantity": "25",
    "reference": "PO-2025-118"
}))]
pub struct RecordMovementRequest {
    /// Movement direction: "in" or "out"
    #[serde(rename = "type")]
    pub movement_type: String,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    /// Strictly positive; direction lives in `type`, never in the sign
    pub quantity: Decimal,
    /// PO/SO/reference number
    pub reference: Option<String>,
    /// Related document id (e.g. shipment id)
    pub related_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    /// Id of the recorded movement
    pub movement_id: Uuid,
    /// Resulting quantity-on-hand for the touched key
    pub quantity: Decimal,
}

impl From<MovementReceipt> for MovementResponse {
    fn from(receipt: MovementReceipt) -> Self {
        Self {
            movement_id: receipt.movement_id,
            quantity: receipt.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub warehouse_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockEntryResponse {
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
}

impl From<stock_level::Model> for StockEntryResponse {
    fn from(model: stock_level::Model) -> Self {
        Self {
            warehouse_id: model.warehouse_id,
            item_id: model.item_id,
            quantity: model.quantity,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/move",
    request_body = RecordMovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = ApiResponse<MovementResponse>),
        (status = 400, description = "Non-positive quantity or unknown movement type", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock (negative stock disallowed)", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn record_movement(
    State(state): State<AppState>,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MovementResponse>>), ServiceError> {
    payload.validate()?;

    let movement_type = MovementType::from_str(&payload.movement_type).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Unknown movement type '{}'; expected 'in' or 'out'",
            payload.movement_type
        ))
    })?;

    let receipt = state
        .services
        .inventory
        .record_movement(RecordMovementCommand {
            movement_type,
            warehouse_id: payload.warehouse_id,
            item_id: payload.item_id,
            quantity: payload.quantity,
            reference: payload.reference,
            related_id: payload.related_id,
            notes: payload.notes,
        })
        .await?;

    info!("Movement recorded: {}", receipt.movement_id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(receipt.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/stock",
    params(StockQuery),
    responses(
        (status = 200, description = "Stock levels listed", body = ApiResponse<Vec<StockEntryResponse>>)
    ),
    tag = "inventory"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<Vec<StockEntryResponse>> {
    let limit = state.config.clamp_limit(query.limit);

    // A fully-keyed lookup answers even when no movement ever touched the
    // key: absence is zero, not an error
    if let (Some(warehouse_id), Some(item_id)) = (query.warehouse_id, query.item_id) {
        let quantity = state
            .services
            .inventory
            .get_quantity(warehouse_id, item_id)
            .await?;
        return Ok(Json(ApiResponse::success(vec![StockEntryResponse {
            warehouse_id,
            item_id,
            quantity,
        }])));
    }

    let entries = state
        .services
        .inventory
        .list_stock(query.warehouse_id, query.item_id, limit)
        .await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/movements",
    params(StockQuery),
    responses(
        (status = 200, description = "Movement log listed, newest first", body = ApiResponse<Vec<stock_movement::Model>>)
    ),
    tag = "inventory"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> ApiResult<Vec<stock_movement::Model>> {
    let limit = state.config.clamp_limit(query.limit);
    let movements = state
        .services
        .inventory
        .list_movements(query.warehouse_id, query.item_id, limit)
        .await?;
    Ok(Json(ApiResponse::success(movements)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/movements/:id/reverse",
    params(("id" = Uuid, Path, description = "Movement ID to reverse")),
    responses(
        (status = 201, description = "Compensating movement recorded", body = ApiResponse<MovementResponse>),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn reverse_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<MovementResponse>>), ServiceError> {
    let receipt = state.services.inventory.reverse_movement(id).await?;

    info!("Movement {} reversed by {}", id, receipt.movement_id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(receipt.into())),
    ))
}

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/move", post(record_movement))
        .route("/stock", get(get_stock))
        .route("/movements", get(list_movements))
        .route("/movements/:id/reverse", post(reverse_movement))
}
