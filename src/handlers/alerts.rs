use crate::auth::Operator;
use crate::errors::ServiceError;
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct AlertListQuery {
    pub warehouse_id: Option<i32>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct ResolveAlertRequest {
    pub notes: Option<String>,
}

pub fn alert_router() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/:id/resolve", post(resolve_alert))
}

/// Open alerts, newest first
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    params(AlertListQuery),
    responses((status = 200, description = "Pending alerts returned")),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let alerts = state
        .alert_service
        .pending_alerts(query.warehouse_id, query.limit.unwrap_or(50))
        .await?;
    let total = alerts.len();

    Ok((
        StatusCode::OK,
        Json(json!({ "alerts": alerts, "total": total })),
    ))
}

/// Resolve an open alert, recording the resolver
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/resolve",
    params(("id" = i32, Path, description = "Alert id")),
    request_body = ResolveAlertRequest,
    responses(
        (status = 200, description = "Alert resolved"),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing operator identity", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    operator: Operator,
    payload: Option<Json<ResolveAlertRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let notes = payload.and_then(|Json(p)| p.notes);

    let resolved = state
        .alert_service
        .resolve_alert(id, Some(operator.id()), notes.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(resolved)))
}
