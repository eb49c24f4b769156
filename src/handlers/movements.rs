use crate::entities::stock_movement;
use crate::errors::ServiceError;
use crate::services::reports::MovementQuery;
use crate::AppState;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementListQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<i32>,
    pub movement_type: Option<String>,
    pub reason: Option<String>,
    pub reference: Option<String>,
    /// Window size in days, defaults to 30
    pub days: Option<i64>,
    pub limit: Option<u64>,
}

pub fn movement_router() -> Router<AppState> {
    Router::new().route("/movements", get(list_movements))
}

/// Query the stock ledger, newest entries first
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementListQuery),
    responses((status = 200, description = "Ledger entries returned")),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements: Vec<stock_movement::Model> = state
        .report_service
        .movements(MovementQuery {
            product_id: query.product_id,
            warehouse_id: query.warehouse_id,
            movement_type: query.movement_type,
            reason: query.reason,
            reference: query.reference,
            days: query.days.unwrap_or(30),
            limit: query.limit.unwrap_or(100),
        })
        .await?;
    let total = movements.len();

    Ok((
        StatusCode::OK,
        Json(json!({ "movements": movements, "total": total })),
    ))
}
