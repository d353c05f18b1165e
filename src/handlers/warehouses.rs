use crate::{
    entities::warehouse, errors::ServiceError, services::warehouses::CreateWarehouseCommand,
    ApiResponse, ApiResult, AppState, IdResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WarehouseListQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "code": "W1",
    "name": "Rotterdam DC",
    "city": "Rotterdam",
    "country": "NL"
}))]
pub struct CreateWarehouseRequest {
    /// Warehouse short code (unique)
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created", body = ApiResponse<IdResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(payload): Json<CreateWarehouseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdResponse>>), ServiceError> {
    payload.validate()?;

    let id = state
        .services
        .warehouses
        .create_warehouse(CreateWarehouseCommand {
            code: payload.code,
            name: payload.name,
            address: payload.address,
            city: payload.city,
            country: payload.country,
        })
        .await?;

    info!("Warehouse created: {}", id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(IdResponse { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses/:id",
    params(("id" = Uuid, Path, description = "Warehouse ID")),
    responses(
        (status = 200, description = "Warehouse fetched", body = ApiResponse<warehouse::Model>),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<warehouse::Model> {
    match state.services.warehouses.get_warehouse(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(model))),
        None => Err(ServiceError::NotFound(format!(
            "Warehouse {} not found",
            id
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(WarehouseListQuery),
    responses(
        (status = 200, description = "Warehouses listed", body = ApiResponse<Vec<warehouse::Model>>)
    ),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseListQuery>,
) -> ApiResult<Vec<warehouse::Model>> {
    let limit = state.config.clamp_limit(query.limit);
    let warehouses = state.services.warehouses.list_warehouses(limit).await?;
    Ok(Json(ApiResponse::success(warehouses)))
}

/// Creates the router for warehouse endpoints
pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_warehouse))
        .route("/", get(list_warehouses))
        .route("/:id", get(get_warehouse))
}
