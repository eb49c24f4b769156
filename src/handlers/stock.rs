use crate::auth::Operator;
use crate::entities::stock_item;
use crate::errors::ServiceError;
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Balance view returned by every stock endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockItemView {
    pub id: i32,
    pub product_id: Uuid,
    pub warehouse_id: Option<i32>,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    pub low_stock_threshold: i32,
    pub reorder_point: i32,
    pub reorder_quantity: i32,
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<Decimal>,
    pub status: String,
    pub needs_reorder: bool,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub last_sold_at: Option<DateTime<Utc>>,
}

impl From<stock_item::Model> for StockItemView {
    fn from(model: stock_item::Model) -> Self {
        Self {
            available_quantity: model.available_quantity(),
            status: model.stock_status().as_str().to_string(),
            needs_reorder: model.needs_reorder(),
            id: model.id,
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            quantity: model.quantity,
            reserved_quantity: model.reserved_quantity,
            low_stock_threshold: model.low_stock_threshold,
            reorder_point: model.reorder_point,
            reorder_quantity: model.reorder_quantity,
            unit_cost: model.unit_cost,
            last_restocked_at: model.last_restocked_at,
            last_sold_at: model.last_sold_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StockDetailQuery {
    pub warehouse_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StockListQuery {
    pub warehouse_id: Option<i32>,
    /// One of `in`, `low`, `out`
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct WarehouseScopeQuery {
    pub warehouse_id: Option<i32>,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    50
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddStockRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity: i32,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TransferStockRequest {
    pub product_id: Uuid,
    pub from_warehouse_id: i32,
    pub to_warehouse_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

pub fn stock_router() -> Router<AppState> {
    Router::new()
        .route("/stock", get(list_stock))
        .route("/stock/low", get(low_stock))
        .route("/stock/out", get(out_of_stock))
        .route("/stock/reorder", get(reorder))
        .route("/stock/transfer", post(transfer_stock))
        .route("/stock/:product_id", get(get_stock))
        .route("/stock/:product_id/add", post(add_stock))
        .route("/stock/:product_id/adjust", post(adjust_stock))
}

/// List stock balances with status/search filtering
#[utoipa::path(
    get,
    path = "/api/v1/stock",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock list returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_stock(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .report_service
        .list_stock(
            query.warehouse_id,
            query.status.as_deref(),
            query.search.as_deref(),
            query.page,
            query.limit,
        )
        .await?;

    let items: Vec<StockItemView> = items.into_iter().map(StockItemView::from).collect();
    let response = json!({
        "items": items,
        "total": total,
        "page": query.page,
        "limit": query.limit,
    });

    Ok((StatusCode::OK, Json(response)))
}

/// Items at or below their low-stock threshold
#[utoipa::path(
    get,
    path = "/api/v1/stock/low",
    params(WarehouseScopeQuery),
    responses((status = 200, description = "Low stock items returned")),
    tag = "stock"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<WarehouseScopeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .report_service
        .low_stock_items(query.warehouse_id, query.limit)
        .await?;
    let items: Vec<StockItemView> = items.into_iter().map(StockItemView::from).collect();
    let total = items.len();

    Ok((StatusCode::OK, Json(json!({ "items": items, "total": total }))))
}

/// Items with nothing on hand
#[utoipa::path(
    get,
    path = "/api/v1/stock/out",
    params(WarehouseScopeQuery),
    responses((status = 200, description = "Out-of-stock items returned")),
    tag = "stock"
)]
pub async fn out_of_stock(
    State(state): State<AppState>,
    Query(query): Query<WarehouseScopeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .report_service
        .out_of_stock_items(query.warehouse_id, query.limit)
        .await?;
    let items: Vec<StockItemView> = items.into_iter().map(StockItemView::from).collect();
    let total = items.len();

    Ok((StatusCode::OK, Json(json!({ "items": items, "total": total }))))
}

/// Items at or below their reorder point
#[utoipa::path(
    get,
    path = "/api/v1/stock/reorder",
    params(StockDetailQuery),
    responses((status = 200, description = "Reorder candidates returned")),
    tag = "stock"
)]
pub async fn reorder(
    State(state): State<AppState>,
    Query(query): Query<StockDetailQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .report_service
        .reorder_items(query.warehouse_id)
        .await?;
    let items: Vec<StockItemView> = items.into_iter().map(StockItemView::from).collect();
    let total = items.len();

    Ok((StatusCode::OK, Json(json!({ "items": items, "total": total }))))
}

/// Balance view for one product
#[utoipa::path(
    get,
    path = "/api/v1/stock/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        StockDetailQuery
    ),
    responses(
        (status = 200, description = "Balance returned", body = StockItemView),
        (status = 404, description = "Stock not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<StockDetailQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let stock = state
        .stock_service
        .get_stock(product_id, query.warehouse_id)
        .await?;

    Ok((StatusCode::OK, Json(StockItemView::from(stock))))
}

/// Receive stock, rolling the weighted-average unit cost forward
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/add",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        StockDetailQuery
    ),
    request_body = AddStockRequest,
    responses(
        (status = 200, description = "Updated balance", body = StockItemView),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn add_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<StockDetailQuery>,
    operator: Operator,
    Json(payload): Json<AddStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let stock = state
        .stock_service
        .add_stock(
            product_id,
            query.warehouse_id,
            payload.quantity,
            payload.unit_cost,
            payload.reference.as_deref().unwrap_or(""),
            payload.notes.as_deref().unwrap_or(""),
            Some(operator.id()),
        )
        .await?;

    Ok((StatusCode::OK, Json(StockItemView::from(stock))))
}

/// Set the on-hand quantity to an absolute value
#[utoipa::path(
    post,
    path = "/api/v1/stock/{product_id}/adjust",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        StockDetailQuery
    ),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Updated balance", body = StockItemView),
        (status = 404, description = "Stock not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<StockDetailQuery>,
    operator: Operator,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let stock = state
        .stock_service
        .adjust_stock(
            product_id,
            query.warehouse_id,
            payload.quantity,
            payload.reason.as_deref(),
            payload.notes.as_deref().unwrap_or(""),
            Some(operator.id()),
        )
        .await?;

    Ok((StatusCode::OK, Json(StockItemView::from(stock))))
}

/// Move stock between warehouses
#[utoipa::path(
    post,
    path = "/api/v1/stock/transfer",
    request_body = TransferStockRequest,
    responses(
        (status = 200, description = "Both updated balances"),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    operator: Operator,
    Json(payload): Json<TransferStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let (from_stock, to_stock) = state
        .stock_service
        .transfer_stock(
            payload.product_id,
            payload.from_warehouse_id,
            payload.to_warehouse_id,
            payload.quantity,
            payload.notes.as_deref().unwrap_or(""),
            Some(operator.id()),
        )
        .await?;

    let response = json!({
        "from": StockItemView::from(from_stock),
        "to": StockItemView::from(to_stock),
    });

    Ok((StatusCode::OK, Json(response)))
}
