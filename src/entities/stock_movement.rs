use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    In,
    Out,
    Reserve,
    Release,
    Adjustment,
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Reserve => "reserve",
            MovementType::Release => "release",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "reserve" => Some(MovementType::Reserve),
            "release" => Some(MovementType::Release),
            "adjustment" => Some(MovementType::Adjustment),
            "transfer" => Some(MovementType::Transfer),
            _ => None,
        }
    }

    /// Whether entries of this type change the on-hand quantity.
    /// Reserve/release rows track hold bookkeeping only.
    pub fn affects_quantity(&self) -> bool {
        !matches!(self, MovementType::Reserve | MovementType::Release)
    }
}

/// Business reason attached to a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementReason {
    Purchase,
    Sale,
    Return,
    Adjustment,
    Reservation,
    Release,
    Damage,
    TransferIn,
    TransferOut,
    Initial,
    Expired,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Purchase => "purchase",
            MovementReason::Sale => "sale",
            MovementReason::Return => "return",
            MovementReason::Adjustment => "adjustment",
            MovementReason::Reservation => "reservation",
            MovementReason::Release => "release",
            MovementReason::Damage => "damage",
            MovementReason::TransferIn => "transfer_in",
            MovementReason::TransferOut => "transfer_out",
            MovementReason::Initial => "initial",
            MovementReason::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(MovementReason::Purchase),
            "sale" => Some(MovementReason::Sale),
            "return" => Some(MovementReason::Return),
            "adjustment" => Some(MovementReason::Adjustment),
            "reservation" => Some(MovementReason::Reservation),
            "release" => Some(MovementReason::Release),
            "damage" => Some(MovementReason::Damage),
            "transfer_in" => Some(MovementReason::TransferIn),
            "transfer_out" => Some(MovementReason::TransferOut),
            "initial" => Some(MovementReason::Initial),
            "expired" => Some(MovementReason::Expired),
            _ => None,
        }
    }
}

/// Append-only audit record of one balance-affecting event.
/// Rows are written once and never mutated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub stock_item_id: i32,
    pub movement_type: String,
    pub quantity_change: i32,
    pub quantity_before: Option<i32>,
    pub quantity_after: Option<i32>,
    pub reason: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost: Option<Decimal>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_incoming(&self) -> bool {
        self.quantity_change > 0
    }

    pub fn is_outgoing(&self) -> bool {
        self.quantity_change < 0
    }
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
