use crate::{
    catalog::ProductCatalog,
    entities::{
        stock_alert::{self, Entity as StockAlertEntity},
        stock_item::{self, Entity as StockItemEntity},
        stock_movement::{self, Entity as StockMovementEntity, MovementReason},
    },
    errors::ServiceError,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Filters for ledger queries.
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<i32>,
    pub movement_type: Option<String>,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub days: i64,
    pub limit: u64,
}

/// Dashboard aggregates, computed on demand.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryStatistics {
    pub total_products: u64,
    #[schema(value_type = String)]
    pub total_stock_value: Decimal,
    pub in_stock_count: u64,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub pending_alerts: u64,
    pub movements_today: u64,
    pub items_sold_today: i64,
    pub items_received_today: i64,
}

/// Per-reason ledger rollup over a bounded window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovementSummary {
    pub period_days: i64,
    pub total_movements: u64,
    pub by_reason: Vec<ReasonSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReasonSummary {
    pub reason: String,
    pub count: u64,
    pub total_quantity: i64,
}

/// Read-only reporting over balances, the ledger, and alerts. Nothing
/// here mutates state or takes row locks.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DatabaseConnection>,
    catalog: Arc<dyn ProductCatalog>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DatabaseConnection>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { db_pool, catalog }
    }

    /// Items sitting at or below their low-stock threshold but not yet
    /// exhausted, scarcest first.
    #[instrument(skip(self))]
    pub async fn low_stock_items(
        &self,
        warehouse_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<stock_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockItemEntity::find()
            .filter(stock_item::Column::Quantity.gt(0))
            .filter(
                Expr::col(stock_item::Column::Quantity)
                    .lte(Expr::col(stock_item::Column::LowStockThreshold)),
            )
            .order_by_asc(stock_item::Column::Quantity)
            .limit(limit);
        if let Some(wh) = warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(wh));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn out_of_stock_items(
        &self,
        warehouse_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<stock_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockItemEntity::find()
            .filter(stock_item::Column::Quantity.lte(0))
            .limit(limit);
        if let Some(wh) = warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(wh));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    /// Items at or below their reorder point, scarcest first.
    #[instrument(skip(self))]
    pub async fn reorder_items(
        &self,
        warehouse_id: Option<i32>,
    ) -> Result<Vec<stock_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockItemEntity::find()
            .filter(
                Expr::col(stock_item::Column::Quantity)
                    .lte(Expr::col(stock_item::Column::ReorderPoint)),
            )
            .order_by_asc(stock_item::Column::Quantity);
        if let Some(wh) = warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(wh));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    /// Paginated balance listing with status and product filters.
    /// `status` accepts `in`, `low`, or `out`; `search` matches a
    /// product id.
    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        warehouse_id: Option<i32>,
        status: Option<&str>,
        search: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_item::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let mut query = StockItemEntity::find();
        if let Some(wh) = warehouse_id {
            query = query.filter(stock_item::Column::WarehouseId.eq(wh));
        }
        match status {
            Some("low") => {
                query = query.filter(stock_item::Column::Quantity.gt(0)).filter(
                    Expr::col(stock_item::Column::Quantity)
                        .lte(Expr::col(stock_item::Column::LowStockThreshold)),
                );
            }
            Some("out") => {
                query = query.filter(stock_item::Column::Quantity.lte(0));
            }
            Some("in") => {
                query = query.filter(
                    Expr::col(stock_item::Column::Quantity)
                        .gt(Expr::col(stock_item::Column::ReservedQuantity)),
                );
            }
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Unknown status filter '{}'",
                    other
                )));
            }
            None => {}
        }
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            match Uuid::parse_str(search) {
                Ok(product_id) => {
                    query = query.filter(stock_item::Column::ProductId.eq(product_id));
                }
                Err(_) => return Ok((Vec::new(), 0)),
            }
        }
        query = query.order_by_desc(stock_item::Column::UpdatedAt);

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    /// Ledger entries within the query window, newest first.
    #[instrument(skip(self))]
    pub async fn movements(
        &self,
        filter: MovementQuery,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let db = &*self.db_pool;
        let since = Utc::now() - Duration::days(filter.days.max(1));

        let mut query = StockMovementEntity::find()
            .filter(stock_movement::Column::CreatedAt.gte(since))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .limit(filter.limit.clamp(1, 1000));

        if filter.product_id.is_some() || filter.warehouse_id.is_some() {
            query = query.join(JoinType::InnerJoin, stock_movement::Relation::StockItem.def());
            if let Some(product_id) = filter.product_id {
                query = query.filter(stock_item::Column::ProductId.eq(product_id));
            }
            if let Some(wh) = filter.warehouse_id {
                query = query.filter(stock_item::Column::WarehouseId.eq(wh));
            }
        }
        if let Some(movement_type) = filter.movement_type.as_deref() {
            query = query.filter(stock_movement::Column::MovementType.eq(movement_type));
        }
        if let Some(reason) = filter.reason.as_deref() {
            query = query.filter(stock_movement::Column::Reason.eq(reason));
        }
        if let Some(reference) = filter.reference.as_deref() {
            query = query.filter(stock_movement::Column::Reference.contains(reference));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    /// Rolls the ledger window up per reason.
    #[instrument(skip(self))]
    pub async fn movement_summary(
        &self,
        days: i64,
        warehouse_id: Option<i32>,
    ) -> Result<MovementSummary, ServiceError> {
        let db = &*self.db_pool;
        let days = days.max(1);
        let since = Utc::now() - Duration::days(days);

        let mut query =
            StockMovementEntity::find().filter(stock_movement::Column::CreatedAt.gte(since));
        if let Some(wh) = warehouse_id {
            query = query
                .join(JoinType::InnerJoin, stock_movement::Relation::StockItem.def())
                .filter(stock_item::Column::WarehouseId.eq(wh));
        }
        let movements = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut by_reason: BTreeMap<String, (u64, i64)> = BTreeMap::new();
        for movement in &movements {
            let entry = by_reason.entry(movement.reason.clone()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += i64::from(movement.quantity_change);
        }

        Ok(MovementSummary {
            period_days: days,
            total_movements: movements.len() as u64,
            by_reason: by_reason
                .into_iter()
                .map(|(reason, (count, total_quantity))| ReasonSummary {
                    reason,
                    count,
                    total_quantity,
                })
                .collect(),
        })
    }

    /// Dashboard statistics: stock buckets, total value (running unit
    /// cost falling back to the catalog price), alert backlog, and
    /// today's ledger activity.
    #[instrument(skip(self))]
    pub async fn statistics(
        &self,
        warehouse_id: Option<i32>,
    ) -> Result<InventoryStatistics, ServiceError> {
        let db = &*self.db_pool;

        let mut stock_query = StockItemEntity::find();
        if let Some(wh) = warehouse_id {
            stock_query = stock_query.filter(stock_item::Column::WarehouseId.eq(wh));
        }
        let stock_items = stock_query.all(db).await.map_err(ServiceError::db_error)?;

        let mut total_stock_value = Decimal::ZERO;
        let mut in_stock_count = 0u64;
        let mut low_stock_count = 0u64;
        let mut out_of_stock_count = 0u64;
        for item in &stock_items {
            let line_value = match item.stock_value() {
                Some(value) => Some(value),
                None => self
                    .catalog
                    .price(item.product_id)
                    .await?
                    .map(|price| price * Decimal::from(item.quantity)),
            };
            if let Some(value) = line_value {
                total_stock_value += value;
            }

            if item.quantity > item.reserved_quantity {
                in_stock_count += 1;
            }
            if item.quantity > 0 && item.quantity <= item.low_stock_threshold {
                low_stock_count += 1;
            }
            if item.quantity <= 0 {
                out_of_stock_count += 1;
            }
        }

        let mut alert_query =
            StockAlertEntity::find().filter(stock_alert::Column::IsResolved.eq(false));
        if let Some(wh) = warehouse_id {
            alert_query = alert_query
                .join(JoinType::InnerJoin, stock_alert::Relation::StockItem.def())
                .filter(stock_item::Column::WarehouseId.eq(wh));
        }
        let pending_alerts = alert_query
            .count(db)
            .await
            .map_err(ServiceError::db_error)?;

        let today_start = Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        let mut movement_query =
            StockMovementEntity::find().filter(stock_movement::Column::CreatedAt.gte(today_start));
        if let Some(wh) = warehouse_id {
            movement_query = movement_query
                .join(JoinType::InnerJoin, stock_movement::Relation::StockItem.def())
                .filter(stock_item::Column::WarehouseId.eq(wh));
        }
        let todays_movements = movement_query
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut items_sold_today = 0i64;
        let mut items_received_today = 0i64;
        for movement in &todays_movements {
            if movement.reason == MovementReason::Sale.as_str() {
                items_sold_today += i64::from(movement.quantity_change);
            } else if movement.reason == MovementReason::Purchase.as_str() {
                items_received_today += i64::from(movement.quantity_change);
            }
        }

        Ok(InventoryStatistics {
            total_products: stock_items.len() as u64,
            total_stock_value,
            in_stock_count,
            low_stock_count,
            out_of_stock_count,
            pending_alerts,
            movements_today: todays_movements.len() as u64,
            items_sold_today: items_sold_today.abs(),
            items_received_today,
        })
    }
}
