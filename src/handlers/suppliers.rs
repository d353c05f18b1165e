use crate::{
    entities::supplier, errors::ServiceError, services::suppliers::CreateSupplierCommand,
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
pub struct SupplierListQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Acme Packaging BV",
    "contact": "Jane Smith",
    "email": "jane@acme.example"
}))]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub contact: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<IdResponse>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdResponse>>), ServiceError> {
    payload.validate()?;

    let id = state
        .services
        .suppliers
        .create_supplier(CreateSupplierCommand {
            name: payload.name,
            contact: payload.contact,
            email: payload.email,
            phone: payload.phone,
            address: payload.address,
        })
        .await?;

    info!("Supplier created: {}", id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(IdResponse { id })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/:id",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier fetched", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<supplier::Model> {
    match state.services.suppliers.get_supplier(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(model))),
        None => Err(ServiceError::NotFound(format!("Supplier {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(SupplierListQuery),
    responses(
        (status = 200, description = "Suppliers listed", body = ApiResponse<Vec<supplier::Model>>)
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
) -> ApiResult<Vec<supplier::Model>> {
    let limit = state.config.clamp_limit(query.limit);
    let suppliers = state.services.suppliers.list_suppliers(limit).await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

/// Creates the router for supplier endpoints
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/:id", get(get_supplier))
}
