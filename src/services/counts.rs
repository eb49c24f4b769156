use crate::{
    entities::{
        inventory_count::{self, CountStatus, Entity as InventoryCountEntity},
        inventory_count_item::{self, Entity as InventoryCountItemEntity},
        stock_item::{self, Entity as StockItemEntity},
        stock_movement::MovementReason,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::StockService,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Cycle-count sessions: snapshot system quantities, record physical
/// counts, and replay variances through the locked adjustment path on
/// completion.
#[derive(Clone)]
pub struct CountService {
    db_pool: Arc<DatabaseConnection>,
    stock_service: StockService,
    event_sender: EventSender,
}

impl CountService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        stock_service: StockService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db_pool,
            stock_service,
            event_sender,
        }
    }

    /// Creates a draft session and snapshots the current system quantity
    /// of every stock item in scope.
    #[instrument(skip(self, product_ids))]
    pub async fn create_count(
        &self,
        name: &str,
        warehouse_id: Option<i32>,
        product_ids: Option<Vec<Uuid>>,
        notes: Option<&str>,
        operator: Option<&str>,
    ) -> Result<inventory_count::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Count name must not be empty".to_string(),
            ));
        }
        let name = name.to_string();
        let notes = notes.map(str::to_string);
        let operator = operator.map(str::to_string);

        let count = self
            .db_pool
            .transaction::<_, inventory_count::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let count = inventory_count::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        warehouse_id: Set(warehouse_id),
                        name: Set(name),
                        status: Set(CountStatus::Draft.as_str().to_string()),
                        created_by: Set(operator),
                        notes: Set(notes),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut query = StockItemEntity::find();
                    if let Some(wh) = warehouse_id {
                        query = query.filter(stock_item::Column::WarehouseId.eq(wh));
                    }
                    if let Some(products) = product_ids {
                        query = query.filter(stock_item::Column::ProductId.is_in(products));
                    }
                    let stock_items = query.all(txn).await.map_err(ServiceError::db_error)?;

                    for stock in stock_items {
                        inventory_count_item::ActiveModel {
                            inventory_count_id: Set(count.id),
                            stock_item_id: Set(stock.id),
                            system_quantity: Set(stock.quantity),
                            created_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    }

                    Ok(count)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(count_id = %count.id, "Created inventory count");
        Ok(count)
    }

    pub async fn get_count(
        &self,
        count_id: Uuid,
    ) -> Result<(inventory_count::Model, Vec<inventory_count_item::Model>), ServiceError> {
        let db = &*self.db_pool;

        let count = InventoryCountEntity::find_by_id(count_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Count {} not found", count_id)))?;

        let items = InventoryCountItemEntity::find()
            .filter(inventory_count_item::Column::InventoryCountId.eq(count_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((count, items))
    }

    #[instrument(skip(self))]
    pub async fn list_counts(
        &self,
        warehouse_id: Option<i32>,
        status: Option<&str>,
        limit: u64,
    ) -> Result<Vec<inventory_count::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = InventoryCountEntity::find()
            .order_by_desc(inventory_count::Column::CreatedAt)
            .limit(limit);
        if let Some(wh) = warehouse_id {
            query = query.filter(inventory_count::Column::WarehouseId.eq(wh));
        }
        if let Some(status) = status {
            query = query.filter(inventory_count::Column::Status.eq(status));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    /// Moves a draft session into progress and stamps `started_at`.
    #[instrument(skip(self))]
    pub async fn start_count(
        &self,
        count_id: Uuid,
    ) -> Result<inventory_count::Model, ServiceError> {
        let db = &*self.db_pool;

        let count = self.load_count(count_id).await?;
        match count_status(&count)? {
            CountStatus::Draft => {}
            other => {
                return Err(ServiceError::business_rule(
                    "count_not_draft",
                    format!("Cannot start a count in state {}", other.as_str()),
                ));
            }
        }

        let now = Utc::now();
        let mut active: inventory_count::ActiveModel = count.into();
        active.status = Set(CountStatus::InProgress.as_str().to_string());
        active.started_at = Set(Some(now));
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(count_id = %count_id, "Started inventory count");
        Ok(updated)
    }

    /// Records the physically counted quantity for one count item.
    /// Rejected once the owning session has reached a terminal state.
    #[instrument(skip(self))]
    pub async fn update_count_item(
        &self,
        item_id: i64,
        counted_quantity: i32,
        notes: Option<&str>,
        operator: Option<&str>,
    ) -> Result<inventory_count_item::Model, ServiceError> {
        let db = &*self.db_pool;

        let item = InventoryCountItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Count item {} not found", item_id)))?;

        let count = self.load_count(item.inventory_count_id).await?;
        if count_status(&count)?.is_terminal() {
            return Err(ServiceError::business_rule(
                "count_not_in_progress",
                format!("Count {} is already {}", count.id, count.status),
            ));
        }

        let mut active: inventory_count_item::ActiveModel = item.into();
        active.counted_quantity = Set(Some(counted_quantity));
        if let Some(notes) = notes {
            active.notes = Set(Some(notes.to_string()));
        }
        active.counted_by = Set(operator.map(str::to_string));
        active.counted_at = Set(Some(Utc::now()));

        active.update(db).await.map_err(ServiceError::db_error)
    }

    /// Completes an in-progress session. With `apply_adjustments`, every
    /// counted item whose quantity diverges from the snapshot replays
    /// through the locked adjustment path; without it the session closes
    /// as a dry run and no balance changes.
    #[instrument(skip(self))]
    pub async fn complete_count(
        &self,
        count_id: Uuid,
        apply_adjustments: bool,
        operator: Option<&str>,
    ) -> Result<inventory_count::Model, ServiceError> {
        let db = &*self.db_pool;

        let count = self.load_count(count_id).await?;
        match count_status(&count)? {
            CountStatus::InProgress => {}
            CountStatus::Completed => {
                return Err(ServiceError::business_rule(
                    "count_already_completed",
                    format!("Count {} is already completed", count_id),
                ));
            }
            other => {
                return Err(ServiceError::business_rule(
                    "count_not_in_progress",
                    format!("Cannot complete a count in state {}", other.as_str()),
                ));
            }
        }

        let mut adjustments_applied = 0u32;
        if apply_adjustments {
            let items = InventoryCountItemEntity::find()
                .filter(inventory_count_item::Column::InventoryCountId.eq(count_id))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;

            for item in items {
                let Some(counted) = item.counted_quantity else {
                    continue;
                };
                if item.variance() == 0 {
                    continue;
                }

                let Some(stock) = StockItemEntity::find_by_id(item.stock_item_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                else {
                    warn!(
                        count_id = %count_id,
                        stock_item_id = %item.stock_item_id,
                        "Count item references a missing stock item; skipping"
                    );
                    continue;
                };

                self.stock_service
                    .adjust_stock(
                        stock.product_id,
                        stock.warehouse_id,
                        counted,
                        Some(MovementReason::Adjustment.as_str()),
                        &format!("Inventory count: {}", count.name),
                        operator,
                    )
                    .await?;
                adjustments_applied += 1;
            }
        }

        let now = Utc::now();
        let mut active: inventory_count::ActiveModel = count.into();
        active.status = Set(CountStatus::Completed.as_str().to_string());
        active.completed_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(
            count_id = %count_id,
            adjustments_applied = %adjustments_applied,
            "Completed inventory count"
        );
        if let Err(e) = self
            .event_sender
            .send(Event::CountCompleted {
                count_id,
                adjustments_applied,
            })
            .await
        {
            warn!(error = %e, "Failed to publish count completion event");
        }

        Ok(updated)
    }

    /// Abandons a non-terminal session.
    #[instrument(skip(self))]
    pub async fn cancel_count(
        &self,
        count_id: Uuid,
    ) -> Result<inventory_count::Model, ServiceError> {
        let db = &*self.db_pool;

        let count = self.load_count(count_id).await?;
        if count_status(&count)?.is_terminal() {
            return Err(ServiceError::business_rule(
                "count_not_in_progress",
                format!("Count {} is already {}", count_id, count.status),
            ));
        }

        let now = Utc::now();
        let mut active: inventory_count::ActiveModel = count.into();
        active.status = Set(CountStatus::Cancelled.as_str().to_string());
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;
        info!(count_id = %count_id, "Cancelled inventory count");
        Ok(updated)
    }

    async fn load_count(&self, count_id: Uuid) -> Result<inventory_count::Model, ServiceError> {
        InventoryCountEntity::find_by_id(count_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Count {} not found", count_id)))
    }
}

fn count_status(count: &inventory_count::Model) -> Result<CountStatus, ServiceError> {
    CountStatus::from_str(&count.status).ok_or_else(|| {
        ServiceError::InternalError(format!("Unknown count status '{}'", count.status))
    })
}
