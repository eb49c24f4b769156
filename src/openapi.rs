use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::update_warehouse,
        crate::handlers::stock::list_stock,
        crate::handlers::stock::low_stock,
        crate::handlers::stock::out_of_stock,
        crate::handlers::stock::reorder,
        crate::handlers::stock::get_stock,
        crate::handlers::stock::add_stock,
        crate::handlers::stock::adjust_stock,
        crate::handlers::stock::transfer_stock,
        crate::handlers::movements::list_movements,
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::resolve_alert,
        crate::handlers::counts::list_counts,
        crate::handlers::counts::create_count,
        crate::handlers::counts::get_count,
        crate::handlers::counts::start_count,
        crate::handlers::counts::complete_count,
        crate::handlers::counts::cancel_count,
        crate::handlers::counts::update_count_item,
        crate::handlers::statistics::get_statistics,
        crate::handlers::statistics::get_movement_summary,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::stock::StockItemView,
        crate::handlers::stock::AddStockRequest,
        crate::handlers::stock::AdjustStockRequest,
        crate::handlers::stock::TransferStockRequest,
        crate::handlers::warehouses::CreateWarehouseRequest,
        crate::handlers::warehouses::UpdateWarehouseRequest,
        crate::handlers::alerts::ResolveAlertRequest,
        crate::handlers::counts::CreateCountRequest,
        crate::handlers::counts::CompleteCountRequest,
        crate::handlers::counts::UpdateCountItemRequest,
        crate::handlers::counts::CountItemView,
        crate::services::reports::InventoryStatistics,
        crate::services::reports::MovementSummary,
        crate::services::reports::ReasonSummary,
    )),
    tags(
        (name = "warehouses", description = "Warehouse registry"),
        (name = "stock", description = "Stock balances and transitions"),
        (name = "movements", description = "Immutable stock ledger"),
        (name = "alerts", description = "Derived stock alerts"),
        (name = "counts", description = "Cycle-count sessions"),
        (name = "statistics", description = "Dashboard aggregates"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "stockledger-api",
        description = "Inventory stock ledger and reservation engine"
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
