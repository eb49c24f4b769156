use crate::auth::Operator;
use crate::entities::warehouse;
use crate::errors::ServiceError;
use crate::services::warehouses::{NewWarehouse, WarehouseChanges};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
}

#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct UpdateWarehouseRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub allow_negative_stock: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct WarehouseListQuery {
    /// When true (default), only active warehouses are returned
    pub active_only: Option<bool>,
}

pub fn warehouse_router() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/warehouses/:id", get(get_warehouse).patch(update_warehouse))
}

/// List warehouses, default first
#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(WarehouseListQuery),
    responses((status = 200, description = "Warehouse list returned")),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state
        .warehouse_service
        .list_warehouses(query.active_only.unwrap_or(true))
        .await?;
    let total = warehouses.len();

    Ok((
        StatusCode::OK,
        Json(json!({ "warehouses": warehouses, "total": total })),
    ))
}

/// Register a warehouse
#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    _operator: Operator,
    Json(payload): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let created = state
        .warehouse_service
        .create_warehouse(NewWarehouse {
            name: payload.name,
            code: payload.code,
            address: payload.address,
            contact_name: payload.contact_name,
            contact_phone: payload.contact_phone,
            contact_email: payload.contact_email,
            is_default: payload.is_default,
            allow_negative_stock: payload.allow_negative_stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch one warehouse
#[utoipa::path(
    get,
    path = "/api/v1/warehouses/{id}",
    params(("id" = i32, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse returned"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let found: warehouse::Model = state.warehouse_service.get_warehouse(id).await?;
    Ok((StatusCode::OK, Json(found)))
}

/// Update a warehouse; promoting one to default demotes the others
#[utoipa::path(
    patch,
    path = "/api/v1/warehouses/{id}",
    params(("id" = i32, Path, description = "Warehouse id")),
    request_body = UpdateWarehouseRequest,
    responses(
        (status = 200, description = "Warehouse updated"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _operator: Operator,
    Json(payload): Json<UpdateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .warehouse_service
        .update_warehouse(
            id,
            WarehouseChanges {
                name: payload.name,
                address: payload.address,
                contact_name: payload.contact_name,
                contact_phone: payload.contact_phone,
                contact_email: payload.contact_email,
                is_active: payload.is_active,
                is_default: payload.is_default,
                allow_negative_stock: payload.allow_negative_stock,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(updated)))
}
