use crate::auth::Operator;
use crate::entities::{inventory_count, inventory_count_item};
use crate::errors::ServiceError;
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCountRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub warehouse_id: Option<i32>,
    /// Restrict the session to these products; all stock in scope otherwise
    pub product_ids: Option<Vec<Uuid>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteCountRequest {
    #[serde(default = "default_apply")]
    pub apply_adjustments: bool,
}

fn default_apply() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCountItemRequest {
    pub counted_quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct CountListQuery {
    pub warehouse_id: Option<i32>,
    pub status: Option<String>,
    pub limit: Option<u64>,
}

/// Count item plus its derived variance.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountItemView {
    pub id: i64,
    pub stock_item_id: i32,
    pub system_quantity: i32,
    pub counted_quantity: Option<i32>,
    pub variance: i32,
    pub notes: Option<String>,
    pub counted_by: Option<String>,
}

impl From<inventory_count_item::Model> for CountItemView {
    fn from(model: inventory_count_item::Model) -> Self {
        Self {
            variance: model.variance(),
            id: model.id,
            stock_item_id: model.stock_item_id,
            system_quantity: model.system_quantity,
            counted_quantity: model.counted_quantity,
            notes: model.notes,
            counted_by: model.counted_by,
        }
    }
}

pub fn count_router() -> Router<AppState> {
    Router::new()
        .route("/counts", get(list_counts).post(create_count))
        .route("/counts/:id", get(get_count))
        .route("/counts/:id/start", post(start_count))
        .route("/counts/:id/complete", post(complete_count))
        .route("/counts/:id/cancel", post(cancel_count))
        .route("/counts/items/:item_id", post(update_count_item))
}

/// List cycle-count sessions
#[utoipa::path(
    get,
    path = "/api/v1/counts",
    params(CountListQuery),
    responses((status = 200, description = "Count sessions returned")),
    tag = "counts"
)]
pub async fn list_counts(
    State(state): State<AppState>,
    Query(query): Query<CountListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let counts: Vec<inventory_count::Model> = state
        .count_service
        .list_counts(
            query.warehouse_id,
            query.status.as_deref(),
            query.limit.unwrap_or(50),
        )
        .await?;
    let total = counts.len();

    Ok((
        StatusCode::OK,
        Json(json!({ "counts": counts, "total": total })),
    ))
}

/// Create a draft session, snapshotting system quantities
#[utoipa::path(
    post,
    path = "/api/v1/counts",
    request_body = CreateCountRequest,
    responses(
        (status = 201, description = "Count session created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn create_count(
    State(state): State<AppState>,
    operator: Operator,
    Json(payload): Json<CreateCountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let count = state
        .count_service
        .create_count(
            &payload.name,
            payload.warehouse_id,
            payload.product_ids,
            payload.notes.as_deref(),
            Some(operator.id()),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(count)))
}

/// Fetch a session with its items and variances
#[utoipa::path(
    get,
    path = "/api/v1/counts/{id}",
    params(("id" = Uuid, Path, description = "Count id")),
    responses(
        (status = 200, description = "Count session returned"),
        (status = 404, description = "Count not found", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn get_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (count, items) = state.count_service.get_count(id).await?;
    let items: Vec<CountItemView> = items.into_iter().map(CountItemView::from).collect();

    Ok((
        StatusCode::OK,
        Json(json!({ "count": count, "items": items })),
    ))
}

/// Move a draft session into progress
#[utoipa::path(
    post,
    path = "/api/v1/counts/{id}/start",
    params(("id" = Uuid, Path, description = "Count id")),
    responses(
        (status = 200, description = "Count started"),
        (status = 422, description = "Count is not a draft", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn start_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _operator: Operator,
) -> Result<impl IntoResponse, ServiceError> {
    let count = state.count_service.start_count(id).await?;
    Ok((StatusCode::OK, Json(count)))
}

/// Complete a session, optionally posting variance adjustments
#[utoipa::path(
    post,
    path = "/api/v1/counts/{id}/complete",
    params(("id" = Uuid, Path, description = "Count id")),
    request_body = CompleteCountRequest,
    responses(
        (status = 200, description = "Count completed"),
        (status = 422, description = "Count is not in progress", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn complete_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    operator: Operator,
    payload: Option<Json<CompleteCountRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let apply_adjustments = payload.map(|Json(p)| p.apply_adjustments).unwrap_or(true);

    let count = state
        .count_service
        .complete_count(id, apply_adjustments, Some(operator.id()))
        .await?;

    Ok((StatusCode::OK, Json(count)))
}

/// Abandon a non-terminal session
#[utoipa::path(
    post,
    path = "/api/v1/counts/{id}/cancel",
    params(("id" = Uuid, Path, description = "Count id")),
    responses(
        (status = 200, description = "Count cancelled"),
        (status = 422, description = "Count already terminal", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn cancel_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _operator: Operator,
) -> Result<impl IntoResponse, ServiceError> {
    let count = state.count_service.cancel_count(id).await?;
    Ok((StatusCode::OK, Json(count)))
}

/// Record the physically counted quantity for one item
#[utoipa::path(
    post,
    path = "/api/v1/counts/items/{item_id}",
    params(("item_id" = i64, Path, description = "Count item id")),
    request_body = UpdateCountItemRequest,
    responses(
        (status = 200, description = "Count item updated"),
        (status = 404, description = "Count item not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "counts"
)]
pub async fn update_count_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    operator: Operator,
    Json(payload): Json<UpdateCountItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .count_service
        .update_count_item(
            item_id,
            payload.counted_quantity,
            payload.notes.as_deref(),
            Some(operator.id()),
        )
        .await?;

    Ok((StatusCode::OK, Json(CountItemView::from(item))))
}
