use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock level bucket derived from the current balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

/// Materialized balance for one (product, warehouse) pair.
///
/// `quantity` is signed: warehouses that tolerate negative stock can drive
/// it below zero. `reserved_quantity` never goes negative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: Uuid,
    pub warehouse_id: Option<i32>,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub low_stock_threshold: i32,
    pub reorder_point: i32,
    pub reorder_quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost: Option<Decimal>,
    pub last_restocked_at: Option<DateTime<Utc>>,
    pub last_sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// On-hand quantity minus reserved, floored at zero.
    pub fn available_quantity(&self) -> i32 {
        (self.quantity - self.reserved_quantity).max(0)
    }

    pub fn is_in_stock(&self) -> bool {
        self.available_quantity() > 0
    }

    pub fn is_low_stock(&self) -> bool {
        let available = self.available_quantity();
        available > 0 && available <= self.low_stock_threshold
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.available_quantity() <= 0
    }

    pub fn needs_reorder(&self) -> bool {
        self.available_quantity() <= self.reorder_point
    }

    pub fn stock_status(&self) -> StockStatus {
        if self.is_out_of_stock() {
            StockStatus::OutOfStock
        } else if self.is_low_stock() {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// Valuation of the on-hand quantity at the running unit cost, when known.
    pub fn stock_value(&self) -> Option<Decimal> {
        self.unit_cost.map(|cost| cost * Decimal::from(self.quantity))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovement,
    #[sea_orm(has_many = "super::stock_alert::Entity")]
    StockAlert,
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovement.def()
    }
}

impl Related<super::stock_alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockAlert.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
