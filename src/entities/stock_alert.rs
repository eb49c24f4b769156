use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    LowStock,
    OutOfStock,
    Reorder,
    Expiring,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::OutOfStock => "out_of_stock",
            AlertType::Reorder => "reorder",
            AlertType::Expiring => "expiring",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low_stock" => Some(AlertType::LowStock),
            "out_of_stock" => Some(AlertType::OutOfStock),
            "reorder" => Some(AlertType::Reorder),
            "expiring" => Some(AlertType::Expiring),
            _ => None,
        }
    }
}

/// Threshold alert derived from a stock item's balance.
/// At most one open row per (stock_item, alert_type).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_item_id: i32,
    pub alert_type: String,
    pub threshold: i32,
    pub current_quantity: i32,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_item::Entity",
        from = "Column::StockItemId",
        to = "super::stock_item::Column::Id"
    )]
    StockItem,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_type_round_trip() {
        for at in [
            AlertType::LowStock,
            AlertType::OutOfStock,
            AlertType::Reorder,
            AlertType::Expiring,
        ] {
            assert_eq!(AlertType::from_str(at.as_str()), Some(at));
        }
        assert_eq!(AlertType::from_str("invalid"), None);
    }
}
