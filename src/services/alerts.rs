use crate::{
    entities::{
        stock_alert::{self, AlertType, Entity as StockAlertEntity},
        stock_item,
    },
    errors::ServiceError,
    events::Event,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Re-evaluates the alert state of a stock item after a balance change.
///
/// Runs inside the caller's transaction so the alert upsert commits
/// together with the balance update and ledger insert. The upsert is
/// keyed on the open row, so a threshold excursion produces exactly one
/// open alert per type; raising one type resolves the other.
pub(crate) async fn reevaluate(
    txn: &DatabaseTransaction,
    stock: &stock_item::Model,
) -> Result<Vec<Event>, ServiceError> {
    let available = stock.available_quantity();

    if stock.is_out_of_stock() {
        upsert_open_alert(txn, stock, AlertType::OutOfStock, 0, stock.quantity).await
    } else if stock.is_low_stock() {
        upsert_open_alert(
            txn,
            stock,
            AlertType::LowStock,
            stock.low_stock_threshold,
            available,
        )
        .await
    } else {
        resolve_open_alerts(txn, stock.id, None).await
    }
}

/// Opens (or refreshes) the alert of the given type and resolves any
/// open alert of a different type, keeping at most one type open.
async fn upsert_open_alert(
    txn: &DatabaseTransaction,
    stock: &stock_item::Model,
    alert_type: AlertType,
    threshold: i32,
    current_quantity: i32,
) -> Result<Vec<Event>, ServiceError> {
    let now = Utc::now();
    let mut events = Vec::new();

    let stale: Vec<stock_alert::Model> = StockAlertEntity::find()
        .filter(stock_alert::Column::StockItemId.eq(stock.id))
        .filter(stock_alert::Column::IsResolved.eq(false))
        .filter(stock_alert::Column::AlertType.ne(alert_type.as_str()))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;
    for alert in stale {
        let mut active: stock_alert::ActiveModel = alert.into();
        active.is_resolved = Set(true);
        active.resolved_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        active.update(txn).await.map_err(ServiceError::db_error)?;
    }

    let existing = StockAlertEntity::find()
        .filter(stock_alert::Column::StockItemId.eq(stock.id))
        .filter(stock_alert::Column::AlertType.eq(alert_type.as_str()))
        .filter(stock_alert::Column::IsResolved.eq(false))
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?;

    match existing {
        Some(alert) => {
            let mut active: stock_alert::ActiveModel = alert.into();
            active.threshold = Set(threshold);
            active.current_quantity = Set(current_quantity);
            active.updated_at = Set(Some(now));
            active.update(txn).await.map_err(ServiceError::db_error)?;
        }
        None => {
            let active = stock_alert::ActiveModel {
                stock_item_id: Set(stock.id),
                alert_type: Set(alert_type.as_str().to_string()),
                threshold: Set(threshold),
                current_quantity: Set(current_quantity),
                is_resolved: Set(false),
                created_at: Set(now),
                ..Default::default()
            };
            active.insert(txn).await.map_err(ServiceError::db_error)?;
            events.push(Event::AlertRaised {
                stock_item_id: stock.id,
                alert_type: alert_type.as_str().to_string(),
                current_quantity,
            });
        }
    }

    Ok(events)
}

/// Resolves every open alert for the stock item.
async fn resolve_open_alerts(
    txn: &DatabaseTransaction,
    stock_item_id: i32,
    resolved_by: Option<String>,
) -> Result<Vec<Event>, ServiceError> {
    let open: Vec<stock_alert::Model> = StockAlertEntity::find()
        .filter(stock_alert::Column::StockItemId.eq(stock_item_id))
        .filter(stock_alert::Column::IsResolved.eq(false))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if open.is_empty() {
        return Ok(Vec::new());
    }

    let now = Utc::now();
    for alert in open {
        let mut active: stock_alert::ActiveModel = alert.into();
        active.is_resolved = Set(true);
        active.resolved_at = Set(Some(now));
        active.resolved_by = Set(resolved_by.clone());
        active.updated_at = Set(Some(now));
        active.update(txn).await.map_err(ServiceError::db_error)?;
    }

    Ok(vec![Event::AlertResolved {
        stock_item_id,
        resolved_by,
    }])
}

/// Query and resolution surface for stock alerts.
#[derive(Clone)]
pub struct AlertService {
    db_pool: Arc<DatabaseConnection>,
}

impl AlertService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Open alerts, newest first, optionally scoped to one warehouse.
    #[instrument(skip(self))]
    pub async fn pending_alerts(
        &self,
        warehouse_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<stock_alert::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = StockAlertEntity::find()
            .filter(stock_alert::Column::IsResolved.eq(false))
            .order_by_desc(stock_alert::Column::CreatedAt)
            .limit(limit);

        if let Some(wh) = warehouse_id {
            query = query
                .join(JoinType::InnerJoin, stock_alert::Relation::StockItem.def())
                .filter(stock_item::Column::WarehouseId.eq(wh));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    /// Marks an alert resolved, recording who resolved it and when.
    #[instrument(skip(self))]
    pub async fn resolve_alert(
        &self,
        alert_id: i32,
        resolved_by: Option<&str>,
        notes: Option<&str>,
    ) -> Result<stock_alert::Model, ServiceError> {
        let db = &*self.db_pool;

        let alert = StockAlertEntity::find_by_id(alert_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Alert {} not found", alert_id)))?;

        if alert.is_resolved {
            return Err(ServiceError::ValidationError(
                "Alert is already resolved".to_string(),
            ));
        }

        let now = Utc::now();
        let mut active: stock_alert::ActiveModel = alert.into();
        active.is_resolved = Set(true);
        active.resolved_at = Set(Some(now));
        active.resolved_by = Set(resolved_by.map(str::to_string));
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            active.notes = Set(Some(notes.to_string()));
        }
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(alert_id = %alert_id, "Resolved stock alert");

        Ok(updated)
    }
}
