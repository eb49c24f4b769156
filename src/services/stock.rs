use crate::{
    catalog::ProductCatalog,
    entities::{
        stock_item::{self, Entity as StockItemEntity},
        stock_movement::{self, MovementReason, MovementType},
        warehouse::{self, Entity as WarehouseEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::alerts,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Rolling weighted-average unit cost after receiving `incoming_qty`
/// units at `incoming_cost`. Takes the incoming cost outright when there
/// is no prior cost or no prior positive quantity to weight against.
pub(crate) fn weighted_average_cost(
    current_cost: Option<Decimal>,
    on_hand: i32,
    incoming_cost: Decimal,
    incoming_qty: i32,
) -> Decimal {
    match current_cost {
        Some(current) if on_hand > 0 => {
            let total =
                current * Decimal::from(on_hand) + incoming_cost * Decimal::from(incoming_qty);
            total / Decimal::from(on_hand + incoming_qty)
        }
        _ => incoming_cost,
    }
}

/// Balance and transition engine for stock items.
///
/// Every mutation runs in its own transaction, locks the owning stock
/// row exclusively (`SELECT ... FOR UPDATE`), and commits the balance
/// update, ledger insert, and alert upsert together. Events and the
/// catalog callback run only after commit.
#[derive(Clone)]
pub struct StockService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    catalog: Arc<dyn ProductCatalog>,
    lock_wait_timeout: Duration,
}

impl StockService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        catalog: Arc<dyn ProductCatalog>,
        lock_wait_timeout: Duration,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            catalog,
            lock_wait_timeout,
        }
    }

    /// Bounds the wait for a contended stock row. Expected lock hold
    /// time is one balance update plus one ledger insert, so exceeding
    /// the bound surfaces as a retryable `LockTimeout` rather than an
    /// indefinite stall.
    async fn with_lock_timeout<T, F>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(self.lock_wait_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::LockTimeout),
        }
    }

    async fn publish(&self, events: Vec<Event>) {
        for event in events {
            if let Err(e) = self.event_sender.send(event).await {
                warn!(error = %e, "Failed to publish post-commit event");
            }
        }
    }

    /// Loads the balance row for (product, warehouse).
    pub async fn get_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
    ) -> Result<stock_item::Model, ServiceError> {
        let db = &*self.db_pool;
        find_stock(db, product_id, warehouse_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock not found for {}", product_id)))
    }

    /// Loads or creates the balance row for (product, warehouse).
    pub async fn get_or_create_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
    ) -> Result<stock_item::Model, ServiceError> {
        let db = &*self.db_pool;
        if let Some(existing) = find_stock(db, product_id, warehouse_id).await? {
            return Ok(existing);
        }
        let created = insert_stock_row(db, product_id, warehouse_id).await?;
        info!(product_id = %product_id, "Created stock item");
        Ok(created)
    }

    /// True when at least `quantity` units are available. Missing stock
    /// rows count as unavailable rather than an error.
    pub async fn check_availability(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let db = &*self.db_pool;
        Ok(find_stock(db, product_id, warehouse_id)
            .await?
            .map(|stock| stock.available_quantity() >= quantity)
            .unwrap_or(false))
    }

    /// Places a hold of `quantity` units against available stock.
    ///
    /// Returns `false` with no side effects when availability is
    /// insufficient or the stock row does not exist; that is an expected
    /// outcome on the reservation path, not an error.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: &str,
        operator: Option<&str>,
    ) -> Result<bool, ServiceError> {
        validate_positive(quantity)?;
        let reference_event = reference.to_string();
        let reference = reference.to_string();
        let operator = operator.map(str::to_string);

        let reserved = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, bool, ServiceError>(move |txn| {
                        Box::pin(async move {
                            let Some(stock) =
                                find_stock_locked(txn, product_id, warehouse_id).await?
                            else {
                                return Ok(false);
                            };

                            if quantity > stock.available_quantity() {
                                return Ok(false);
                            }

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.reserved_quantity = Set(stock.reserved_quantity + quantity);
                            active.updated_at = Set(Some(Utc::now()));
                            active.update(txn).await.map_err(ServiceError::db_error)?;

                            record_movement(
                                txn,
                                stock.id,
                                MovementType::Reserve,
                                -quantity,
                                None,
                                None,
                                MovementReason::Reservation.as_str(),
                                Some(reference),
                                Some(format!("Reserved {} units", quantity)),
                                None,
                                operator,
                            )
                            .await?;

                            Ok(true)
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        if reserved {
            self.publish(vec![Event::StockReserved {
                product_id,
                warehouse_id,
                quantity,
                reference: reference_event,
            }])
            .await;
        }
        Ok(reserved)
    }

    /// Releases up to `quantity` held units, clamped to the current
    /// hold. Returns the amount actually released.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: &str,
        operator: Option<&str>,
    ) -> Result<i32, ServiceError> {
        validate_positive(quantity)?;
        let reference_event = reference.to_string();
        let reference = reference.to_string();
        let operator = operator.map(str::to_string);

        let released = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, i32, ServiceError>(move |txn| {
                        Box::pin(async move {
                            let Some(stock) =
                                find_stock_locked(txn, product_id, warehouse_id).await?
                            else {
                                return Ok(0);
                            };

                            let release_amount = quantity.min(stock.reserved_quantity);
                            if release_amount <= 0 {
                                return Ok(0);
                            }
                            if release_amount < quantity {
                                warn!(
                                    product_id = %product_id,
                                    requested = %quantity,
                                    applied = %release_amount,
                                    "Release clamped to current hold"
                                );
                            }

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.reserved_quantity =
                                Set(stock.reserved_quantity - release_amount);
                            active.updated_at = Set(Some(Utc::now()));
                            active.update(txn).await.map_err(ServiceError::db_error)?;

                            record_movement(
                                txn,
                                stock.id,
                                MovementType::Release,
                                release_amount,
                                None,
                                None,
                                MovementReason::Release.as_str(),
                                Some(reference),
                                Some(format!("Released {} reserved units", release_amount)),
                                None,
                                operator,
                            )
                            .await?;

                            Ok(release_amount)
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        if released > 0 {
            self.publish(vec![Event::StockReleased {
                product_id,
                warehouse_id,
                quantity: released,
                reference: reference_event,
            }])
            .await;
        }
        Ok(released)
    }

    /// Confirms a sale: deducts from on-hand quantity and consumes the
    /// matching hold in one compound update, then notifies the catalog.
    ///
    /// Selling more than is on hand is rejected unless the warehouse
    /// tolerates negative stock.
    #[instrument(skip(self))]
    pub async fn confirm_sale(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: &str,
        operator: Option<&str>,
    ) -> Result<stock_item::Model, ServiceError> {
        validate_positive(quantity)?;
        let reference_owned = reference.to_string();
        let operator = operator.map(str::to_string);

        let (updated, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (stock_item::Model, Vec<Event>), ServiceError>(move |txn| {
                        Box::pin(async move {
                            let stock = find_stock_locked(txn, product_id, warehouse_id)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Stock not found for {}",
                                        product_id
                                    ))
                                })?;

                            if quantity > stock.quantity
                                && !warehouse_allows_negative(txn, stock.warehouse_id).await?
                            {
                                return Err(ServiceError::business_rule(
                                    "oversell",
                                    format!(
                                        "Cannot sell {} units; only {} on hand",
                                        quantity, stock.quantity
                                    ),
                                ));
                            }

                            let quantity_before = stock.quantity;
                            let reserved_to_deduct = quantity.min(stock.reserved_quantity);
                            let new_quantity = stock.quantity - quantity;

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.quantity = Set(new_quantity);
                            active.reserved_quantity =
                                Set(stock.reserved_quantity - reserved_to_deduct);
                            active.last_sold_at = Set(Some(Utc::now()));
                            active.updated_at = Set(Some(Utc::now()));
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            record_movement(
                                txn,
                                stock.id,
                                MovementType::Out,
                                -quantity,
                                Some(quantity_before),
                                Some(new_quantity),
                                MovementReason::Sale.as_str(),
                                Some(reference_owned),
                                Some(format!("Sold {} units", quantity)),
                                None,
                                operator,
                            )
                            .await?;

                            let alert_events = alerts::reevaluate(txn, &updated).await?;
                            Ok((updated, alert_events))
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        // Post-commit collaborator callback; the sale itself is durable
        // even if the counter update fails.
        if let Err(e) = self.catalog.increment_sold_count(product_id, quantity).await {
            warn!(product_id = %product_id, error = %e, "Catalog sold-count update failed");
        }

        let mut all_events = vec![Event::SaleConfirmed {
            product_id,
            warehouse_id,
            quantity,
            reference: reference.to_string(),
        }];
        all_events.extend(events);
        self.publish(all_events).await;

        Ok(updated)
    }

    /// Receives `quantity` units into stock, creating the balance row on
    /// first use and rolling the weighted-average unit cost forward.
    #[instrument(skip(self))]
    pub async fn add_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        unit_cost: Option<Decimal>,
        reference: &str,
        notes: &str,
        operator: Option<&str>,
    ) -> Result<stock_item::Model, ServiceError> {
        validate_positive(quantity)?;
        let reference_owned = reference.to_string();
        let notes_owned = notes.to_string();
        let operator = operator.map(str::to_string);

        let (updated, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (stock_item::Model, Vec<Event>), ServiceError>(move |txn| {
                        Box::pin(async move {
                            let stock = match find_stock_locked(txn, product_id, warehouse_id)
                                .await?
                            {
                                Some(existing) => existing,
                                None => insert_stock_row(txn, product_id, warehouse_id).await?,
                            };

                            let old_quantity = stock.quantity;
                            let new_quantity = old_quantity + quantity;
                            let new_unit_cost = match unit_cost {
                                Some(incoming) => Some(weighted_average_cost(
                                    stock.unit_cost,
                                    old_quantity,
                                    incoming,
                                    quantity,
                                )),
                                None => stock.unit_cost,
                            };

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.quantity = Set(new_quantity);
                            active.unit_cost = Set(new_unit_cost);
                            active.last_restocked_at = Set(Some(Utc::now()));
                            active.updated_at = Set(Some(Utc::now()));
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            let notes = if notes_owned.is_empty() {
                                format!("Added {} units", quantity)
                            } else {
                                notes_owned
                            };
                            record_movement(
                                txn,
                                stock.id,
                                MovementType::In,
                                quantity,
                                Some(old_quantity),
                                Some(new_quantity),
                                MovementReason::Purchase.as_str(),
                                Some(reference_owned),
                                Some(notes),
                                unit_cost,
                                operator,
                            )
                            .await?;

                            let mut events = alerts::reevaluate(txn, &updated).await?;
                            events.push(Event::StockAdded {
                                product_id,
                                warehouse_id,
                                quantity,
                                new_quantity,
                            });
                            Ok((updated, events))
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        self.publish(events).await;
        Ok(updated)
    }

    /// Sets the on-hand quantity to an absolute value; the ledger entry
    /// records the signed delta.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        new_quantity: i32,
        reason: Option<&str>,
        notes: &str,
        operator: Option<&str>,
    ) -> Result<stock_item::Model, ServiceError> {
        let reason_owned = reason
            .filter(|r| !r.is_empty())
            .unwrap_or(MovementReason::Adjustment.as_str())
            .to_string();
        let notes_owned = notes.to_string();
        let operator = operator.map(str::to_string);

        let (updated, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (stock_item::Model, Vec<Event>), ServiceError>(move |txn| {
                        Box::pin(async move {
                            let stock = find_stock_locked(txn, product_id, warehouse_id)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Stock not found for {}",
                                        product_id
                                    ))
                                })?;

                            let old_quantity = stock.quantity;
                            let difference = new_quantity - old_quantity;

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.quantity = Set(new_quantity);
                            active.updated_at = Set(Some(Utc::now()));
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            let notes = if notes_owned.is_empty() {
                                format!("Adjusted from {} to {}", old_quantity, new_quantity)
                            } else {
                                notes_owned
                            };
                            record_movement(
                                txn,
                                stock.id,
                                MovementType::Adjustment,
                                difference,
                                Some(old_quantity),
                                Some(new_quantity),
                                &reason_owned,
                                None,
                                Some(notes),
                                None,
                                operator,
                            )
                            .await?;

                            let mut events = alerts::reevaluate(txn, &updated).await?;
                            events.push(Event::StockAdjusted {
                                product_id,
                                warehouse_id,
                                old_quantity,
                                new_quantity,
                                reason: reason_owned,
                            });
                            Ok((updated, events))
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        self.publish(events).await;
        Ok(updated)
    }

    /// Returns `quantity` units to stock, tagged as a customer return.
    #[instrument(skip(self))]
    pub async fn process_return(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: &str,
        operator: Option<&str>,
    ) -> Result<stock_item::Model, ServiceError> {
        validate_positive(quantity)?;
        let reference_owned = reference.to_string();
        let reference_event = reference.to_string();
        let operator = operator.map(str::to_string);

        let (updated, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (stock_item::Model, Vec<Event>), ServiceError>(move |txn| {
                        Box::pin(async move {
                            let stock = find_stock_locked(txn, product_id, warehouse_id)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Stock not found for {}",
                                        product_id
                                    ))
                                })?;

                            let old_quantity = stock.quantity;
                            let new_quantity = old_quantity + quantity;

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.quantity = Set(new_quantity);
                            active.updated_at = Set(Some(Utc::now()));
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            record_movement(
                                txn,
                                stock.id,
                                MovementType::In,
                                quantity,
                                Some(old_quantity),
                                Some(new_quantity),
                                MovementReason::Return.as_str(),
                                Some(reference_owned),
                                Some(format!("Returned {} units", quantity)),
                                None,
                                operator,
                            )
                            .await?;

                            let mut events = alerts::reevaluate(txn, &updated).await?;
                            events.push(Event::StockReturned {
                                product_id,
                                warehouse_id,
                                quantity,
                                reference: reference_event,
                            });
                            Ok((updated, events))
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        self.publish(events).await;
        Ok(updated)
    }

    /// Writes off up to `quantity` damaged or lost units, clamped to the
    /// on-hand quantity. Returns the amount actually deducted; zero
    /// leaves no ledger entry.
    #[instrument(skip(self))]
    pub async fn mark_damaged(
        &self,
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        notes: &str,
        operator: Option<&str>,
    ) -> Result<i32, ServiceError> {
        validate_positive(quantity)?;
        let notes_owned = notes.to_string();
        let operator = operator.map(str::to_string);

        let (deducted, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (i32, Vec<Event>), ServiceError>(move |txn| {
                        Box::pin(async move {
                            let stock = find_stock_locked(txn, product_id, warehouse_id)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Stock not found for {}",
                                        product_id
                                    ))
                                })?;

                            let actual = quantity.min(stock.quantity);
                            if actual <= 0 {
                                return Ok((0, Vec::new()));
                            }
                            if actual < quantity {
                                warn!(
                                    product_id = %product_id,
                                    requested = %quantity,
                                    applied = %actual,
                                    "Damage write-off clamped to on-hand quantity"
                                );
                            }

                            let old_quantity = stock.quantity;
                            let new_quantity = old_quantity - actual;

                            let mut active: stock_item::ActiveModel = stock.clone().into();
                            active.quantity = Set(new_quantity);
                            active.updated_at = Set(Some(Utc::now()));
                            let updated =
                                active.update(txn).await.map_err(ServiceError::db_error)?;

                            let notes = if notes_owned.is_empty() {
                                format!("Damaged/lost {} units", actual)
                            } else {
                                notes_owned
                            };
                            record_movement(
                                txn,
                                stock.id,
                                MovementType::Out,
                                -actual,
                                Some(old_quantity),
                                Some(new_quantity),
                                MovementReason::Damage.as_str(),
                                None,
                                Some(notes),
                                None,
                                operator,
                            )
                            .await?;

                            let mut events = alerts::reevaluate(txn, &updated).await?;
                            events.push(Event::StockDamaged {
                                product_id,
                                warehouse_id,
                                quantity: actual,
                            });
                            Ok((actual, events))
                        })
                    })
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        self.publish(events).await;
        Ok(deducted)
    }

    /// Moves `quantity` units between warehouses. Both rows are locked
    /// inside one transaction, acquired in ascending warehouse-id order
    /// so opposing transfers of the same product cannot deadlock.
    #[instrument(skip(self))]
    pub async fn transfer_stock(
        &self,
        product_id: Uuid,
        from_warehouse_id: i32,
        to_warehouse_id: i32,
        quantity: i32,
        notes: &str,
        operator: Option<&str>,
    ) -> Result<(stock_item::Model, stock_item::Model), ServiceError> {
        validate_positive(quantity)?;
        if from_warehouse_id == to_warehouse_id {
            return Err(ServiceError::business_rule(
                "invalid_transfer",
                "Source and destination warehouses must differ",
            ));
        }
        let notes_owned = notes.to_string();
        let operator = operator.map(str::to_string);

        let (from_stock, to_stock, events) = self
            .with_lock_timeout(async {
                self.db_pool
                    .transaction::<_, (stock_item::Model, stock_item::Model, Vec<Event>), ServiceError>(
                        move |txn| {
                            Box::pin(async move {
                                // Deterministic lock order across the pair.
                                let (source, dest) = if from_warehouse_id < to_warehouse_id {
                                    let source =
                                        lock_transfer_source(txn, product_id, from_warehouse_id)
                                            .await?;
                                    let dest = lock_or_create_stock(
                                        txn,
                                        product_id,
                                        to_warehouse_id,
                                    )
                                    .await?;
                                    (source, dest)
                                } else {
                                    let dest = lock_or_create_stock(
                                        txn,
                                        product_id,
                                        to_warehouse_id,
                                    )
                                    .await?;
                                    let source =
                                        lock_transfer_source(txn, product_id, from_warehouse_id)
                                            .await?;
                                    (source, dest)
                                };

                                if source.available_quantity() < quantity {
                                    return Err(ServiceError::business_rule(
                                        "insufficient_stock",
                                        format!(
                                            "Insufficient stock. Available: {}",
                                            source.available_quantity()
                                        ),
                                    ));
                                }

                                let old_from = source.quantity;
                                let mut active: stock_item::ActiveModel = source.clone().into();
                                active.quantity = Set(old_from - quantity);
                                active.updated_at = Set(Some(Utc::now()));
                                let updated_from =
                                    active.update(txn).await.map_err(ServiceError::db_error)?;

                                record_movement(
                                    txn,
                                    source.id,
                                    MovementType::Transfer,
                                    -quantity,
                                    Some(old_from),
                                    Some(updated_from.quantity),
                                    MovementReason::TransferOut.as_str(),
                                    Some(format!("TO:{}", to_warehouse_id)),
                                    Some(notes_owned.clone()),
                                    None,
                                    operator.clone(),
                                )
                                .await?;

                                let old_to = dest.quantity;
                                let mut active: stock_item::ActiveModel = dest.clone().into();
                                active.quantity = Set(old_to + quantity);
                                active.updated_at = Set(Some(Utc::now()));
                                let updated_to =
                                    active.update(txn).await.map_err(ServiceError::db_error)?;

                                record_movement(
                                    txn,
                                    dest.id,
                                    MovementType::Transfer,
                                    quantity,
                                    Some(old_to),
                                    Some(updated_to.quantity),
                                    MovementReason::TransferIn.as_str(),
                                    Some(format!("FROM:{}", from_warehouse_id)),
                                    Some(notes_owned),
                                    None,
                                    operator,
                                )
                                .await?;

                                let mut events = alerts::reevaluate(txn, &updated_from).await?;
                                events.extend(alerts::reevaluate(txn, &updated_to).await?);
                                events.push(Event::StockTransferred {
                                    product_id,
                                    from_warehouse_id,
                                    to_warehouse_id,
                                    quantity,
                                });
                                Ok((updated_from, updated_to, events))
                            })
                        },
                    )
                    .await
                    .map_err(ServiceError::from)
            })
            .await?;

        info!(
            product_id = %product_id,
            from = %from_warehouse_id,
            to = %to_warehouse_id,
            quantity = %quantity,
            "Transferred stock"
        );
        self.publish(events).await;
        Ok((from_stock, to_stock))
    }
}

fn validate_positive(quantity: i32) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "Quantity must be positive".to_string(),
        ));
    }
    Ok(())
}

async fn find_stock<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Option<i32>,
) -> Result<Option<stock_item::Model>, ServiceError> {
    let mut query = StockItemEntity::find().filter(stock_item::Column::ProductId.eq(product_id));
    if let Some(wh) = warehouse_id {
        query = query.filter(stock_item::Column::WarehouseId.eq(wh));
    }
    query.one(conn).await.map_err(ServiceError::db_error)
}

/// Loads the balance row under an exclusive row lock. The lock is held
/// until the surrounding transaction commits.
async fn find_stock_locked(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: Option<i32>,
) -> Result<Option<stock_item::Model>, ServiceError> {
    let mut query = StockItemEntity::find().filter(stock_item::Column::ProductId.eq(product_id));
    if let Some(wh) = warehouse_id {
        query = query.filter(stock_item::Column::WarehouseId.eq(wh));
    }
    query
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::db_error)
}

async fn insert_stock_row<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Option<i32>,
) -> Result<stock_item::Model, ServiceError> {
    let now = Utc::now();
    let active = stock_item::ActiveModel {
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(0),
        reserved_quantity: Set(0),
        low_stock_threshold: Set(10),
        reorder_point: Set(5),
        reorder_quantity: Set(50),
        unit_cost: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    active.insert(conn).await.map_err(ServiceError::db_error)
}

async fn lock_transfer_source(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: i32,
) -> Result<stock_item::Model, ServiceError> {
    find_stock_locked(txn, product_id, Some(warehouse_id))
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Stock not found for {} in warehouse {}",
                product_id, warehouse_id
            ))
        })
}

async fn lock_or_create_stock(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: i32,
) -> Result<stock_item::Model, ServiceError> {
    match find_stock_locked(txn, product_id, Some(warehouse_id)).await? {
        Some(stock) => Ok(stock),
        None => insert_stock_row(txn, product_id, Some(warehouse_id)).await,
    }
}

async fn warehouse_allows_negative(
    txn: &DatabaseTransaction,
    warehouse_id: Option<i32>,
) -> Result<bool, ServiceError> {
    let Some(id) = warehouse_id else {
        return Ok(false);
    };
    Ok(WarehouseEntity::find_by_id(id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|wh: warehouse::Model| wh.allow_negative_stock)
        .unwrap_or(false))
}

#[allow(clippy::too_many_arguments)]
async fn record_movement(
    txn: &DatabaseTransaction,
    stock_item_id: i32,
    movement_type: MovementType,
    quantity_change: i32,
    quantity_before: Option<i32>,
    quantity_after: Option<i32>,
    reason: &str,
    reference: Option<String>,
    notes: Option<String>,
    unit_cost: Option<Decimal>,
    created_by: Option<String>,
) -> Result<stock_movement::Model, ServiceError> {
    let movement = stock_movement::ActiveModel {
        stock_item_id: Set(stock_item_id),
        movement_type: Set(movement_type.as_str().to_string()),
        quantity_change: Set(quantity_change),
        quantity_before: Set(quantity_before),
        quantity_after: Set(quantity_after),
        reason: Set(reason.to_string()),
        reference: Set(reference.filter(|r| !r.is_empty())),
        notes: Set(notes),
        unit_cost: Set(unit_cost),
        created_by: Set(created_by),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    movement.insert(txn).await.map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn weighted_average_on_empty_balance_takes_incoming_cost() {
        assert_eq!(weighted_average_cost(None, 0, dec!(100), 10), dec!(100));
        assert_eq!(weighted_average_cost(Some(dec!(75)), 0, dec!(100), 10), dec!(100));
    }

    #[test]
    fn weighted_average_blends_proportionally() {
        // 10 @ 100 + 10 @ 200 -> 150
        assert_eq!(
            weighted_average_cost(Some(dec!(100)), 10, dec!(200), 10),
            dec!(150)
        );
        // 30 @ 10 + 10 @ 30 -> 15
        assert_eq!(
            weighted_average_cost(Some(dec!(10)), 30, dec!(30), 10),
            dec!(15)
        );
    }

    #[test]
    fn weighted_average_ignores_negative_on_hand() {
        assert_eq!(weighted_average_cost(Some(dec!(40)), -5, dec!(20), 10), dec!(20));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        assert!(validate_positive(0).is_err());
        assert!(validate_positive(-3).is_err());
        assert!(validate_positive(1).is_ok());
    }
}
