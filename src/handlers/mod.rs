pub mod alerts;
pub mod counts;
pub mod health;
pub mod movements;
pub mod statistics;
pub mod stock;
pub mod warehouses;

use crate::AppState;
use axum::Router;

/// Full v1 API surface. `reserve`/`release`/`confirm_sale` are service
/// operations for trusted internal callers and deliberately have no
/// public route here.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(warehouses::warehouse_router())
        .merge(stock::stock_router())
        .merge(movements::movement_router())
        .merge(alerts::alert_router())
        .merge(counts::count_router())
        .merge(statistics::statistics_router())
}
