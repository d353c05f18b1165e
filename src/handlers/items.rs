use crate::{
    entities::item, errors::ServiceError, services::items::CreateItemCommand, ApiResponse,
    ApiResult, AppState, IdResponse,
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
pub struct ItemListQuery {
    /// Search term matched against SKU and name
    pub q: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "sku": "PAL-4040",
    "name": "Euro pallet 40x40",
    "unit": "pcs",
    "weight_kg": 22.5
}))]
pub struct CreateItemRequest {
    /// Stock keeping unit (unique code)
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    /// Unit of measure, e.g. pcs, box, kg
    #[serde(default = "default_unit")]
    pub unit: String,
    pub barcode: Option<String>,
    #[validate(range(min = 0.0))]
    pub weight_kg: Option<f64>,
    /// LxWxH in cm
    pub dimensions_cm: Option<String>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<IdResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdResponse>>), ServiceError> {
    payload.validate()?;

    let id = state
        .services
        .items
        .create_item(CreateItemCommand {
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            unit: payload.unit,
            barcode: payload.barcode,
            weight_kg: payload.weight_kg,
            dimensions_cm: payload.dimensions_cm,
        })
        .await?;

    info!("Item created: {}", id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(IdResponse { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/:id",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item fetched", body = ApiResponse<item::Model>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<item::Model> {
    match state.services.items.get_item(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(model))),
        None => Err(ServiceError::NotFound(format!("Item {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items listed", body = ApiResponse<Vec<item::Model>>)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Vec<item::Model>> {
    let limit = state.config.clamp_limit(query.limit);
    let items = state.services.items.list_items(query.q, limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Creates the router for item endpoints
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/", get(list_items))
        .route("/:id", get(get_item))
}
