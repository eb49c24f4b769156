use crate::errors::ServiceError;
use crate::services::reports::{InventoryStatistics, MovementSummary};
use crate::AppState;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct StatisticsQuery {
    pub warehouse_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementSummaryQuery {
    pub warehouse_id: Option<i32>,
    /// Window size in days, defaults to 30
    pub days: Option<i64>,
}

pub fn statistics_router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(get_statistics))
        .route("/statistics/movements", get(get_movement_summary))
}

/// Dashboard aggregates, computed on demand
#[utoipa::path(
    get,
    path = "/api/v1/statistics",
    params(StatisticsQuery),
    responses((status = 200, description = "Statistics returned", body = InventoryStatistics)),
    tag = "statistics"
)]
pub async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats: InventoryStatistics = state.report_service.statistics(query.warehouse_id).await?;
    Ok((StatusCode::OK, Json(stats)))
}

/// Per-reason ledger rollup over a bounded window
#[utoipa::path(
    get,
    path = "/api/v1/statistics/movements",
    params(MovementSummaryQuery),
    responses((status = 200, description = "Movement summary returned", body = MovementSummary)),
    tag = "statistics"
)]
pub async fn get_movement_summary(
    State(state): State<AppState>,
    Query(query): Query<MovementSummaryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary: MovementSummary = state
        .report_service
        .movement_summary(query.days.unwrap_or(30), query.warehouse_id)
        .await?;
    Ok((StatusCode::OK, Json(summary)))
}
