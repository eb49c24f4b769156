use crate::{
    entities::warehouse::{self, Entity as WarehouseEntity},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Fields accepted when registering a warehouse.
#[derive(Debug, Clone)]
pub struct NewWarehouse {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub is_default: bool,
    pub allow_negative_stock: bool,
}

/// Partial update for an existing warehouse.
#[derive(Debug, Clone, Default)]
pub struct WarehouseChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub allow_negative_stock: Option<bool>,
}

/// Location registry. Exactly one warehouse is the default: promoting
/// one demotes every other default row in the same transaction.
#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DatabaseConnection>,
}

impl WarehouseService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_warehouse(
        &self,
        input: NewWarehouse,
    ) -> Result<warehouse::Model, ServiceError> {
        if input.name.trim().is_empty() || input.code.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Warehouse name and code must not be empty".to_string(),
            ));
        }

        let created = self
            .db_pool
            .transaction::<_, warehouse::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    if input.is_default {
                        demote_other_defaults(txn, None).await?;
                    }

                    let active = warehouse::ActiveModel {
                        name: Set(input.name),
                        code: Set(input.code),
                        address: Set(input.address),
                        contact_name: Set(input.contact_name),
                        contact_phone: Set(input.contact_phone),
                        contact_email: Set(input.contact_email),
                        is_active: Set(true),
                        is_default: Set(input.is_default),
                        allow_negative_stock: Set(input.allow_negative_stock),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    active.insert(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(warehouse_id = %created.id, code = %created.code, "Created warehouse");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_warehouse(
        &self,
        warehouse_id: i32,
        changes: WarehouseChanges,
    ) -> Result<warehouse::Model, ServiceError> {
        let updated = self
            .db_pool
            .transaction::<_, warehouse::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = WarehouseEntity::find_by_id(warehouse_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Warehouse {} not found",
                                warehouse_id
                            ))
                        })?;

                    if changes.is_default == Some(true) {
                        demote_other_defaults(txn, Some(warehouse_id)).await?;
                    }

                    let mut active: warehouse::ActiveModel = existing.into();
                    if let Some(name) = changes.name {
                        active.name = Set(name);
                    }
                    if let Some(address) = changes.address {
                        active.address = Set(Some(address));
                    }
                    if let Some(contact_name) = changes.contact_name {
                        active.contact_name = Set(Some(contact_name));
                    }
                    if let Some(contact_phone) = changes.contact_phone {
                        active.contact_phone = Set(Some(contact_phone));
                    }
                    if let Some(contact_email) = changes.contact_email {
                        active.contact_email = Set(Some(contact_email));
                    }
                    if let Some(is_active) = changes.is_active {
                        active.is_active = Set(is_active);
                    }
                    if let Some(is_default) = changes.is_default {
                        active.is_default = Set(is_default);
                    }
                    if let Some(allow_negative) = changes.allow_negative_stock {
                        active.allow_negative_stock = Set(allow_negative);
                    }
                    active.updated_at = Set(Some(Utc::now()));

                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        Ok(updated)
    }

    pub async fn get_warehouse(&self, warehouse_id: i32) -> Result<warehouse::Model, ServiceError> {
        WarehouseEntity::find_by_id(warehouse_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", warehouse_id)))
    }

    /// Warehouses ordered default-first, then by name.
    #[instrument(skip(self))]
    pub async fn list_warehouses(
        &self,
        active_only: bool,
    ) -> Result<Vec<warehouse::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = WarehouseEntity::find()
            .order_by_desc(warehouse::Column::IsDefault)
            .order_by_asc(warehouse::Column::Name);
        if active_only {
            query = query.filter(warehouse::Column::IsActive.eq(true));
        }

        query.all(db).await.map_err(ServiceError::db_error)
    }

    pub async fn default_warehouse(&self) -> Result<Option<warehouse::Model>, ServiceError> {
        WarehouseEntity::find()
            .filter(warehouse::Column::IsDefault.eq(true))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

async fn demote_other_defaults(
    txn: &DatabaseTransaction,
    keep_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut update = WarehouseEntity::update_many()
        .col_expr(warehouse::Column::IsDefault, sea_orm::sea_query::Expr::value(false))
        .filter(warehouse::Column::IsDefault.eq(true));
    if let Some(id) = keep_id {
        update = update.filter(warehouse::Column::Id.ne(id));
    }
    update.exec(txn).await.map_err(ServiceError::db_error)?;
    Ok(())
}
