use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stock item inside a cycle-count session: the system quantity
/// snapshotted at session creation plus the physically counted quantity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_count_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub inventory_count_id: Uuid,
    pub stock_item_id: i32,
    pub system_quantity: i32,
    pub counted_quantity: Option<i32>,
    pub notes: Option<String>,
    pub counted_by: Option<String>,
    pub counted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Counted minus system quantity; zero while uncounted.
    pub fn variance(&self) -> i32 {
        match self.counted_quantity {
            Some(counted) => counted - self.system_quantity,
            None => 0,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_count::Entity",
        from = "Column::InventoryCountId",
        to = "super::inventory_count::Column::Id"
    )]
    InventoryCount,
    #[sea_orm(
        belongs_to = "super::stock_item::Entity",
        from = "Column::StockItemId",
        to = "super::stock_item::Column::Id"
    )]
    StockItem,
}

impl Related<super::inventory_count::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryCount.def()
    }
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
