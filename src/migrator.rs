use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_warehouses_table::Migration),
            Box::new(m20240101_000002_create_stock_items_table::Migration),
            Box::new(m20240101_000003_create_stock_movements_table::Migration),
            Box::new(m20240101_000004_create_stock_alerts_table::Migration),
            Box::new(m20240101_000005_create_inventory_counts_table::Migration),
            Box::new(m20240101_000006_create_inventory_count_items_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_warehouses_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_warehouses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Warehouses::Code)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Address).string().null())
                        .col(ColumnDef::new(Warehouses::ContactName).string().null())
                        .col(ColumnDef::new(Warehouses::ContactPhone).string().null())
                        .col(ColumnDef::new(Warehouses::ContactEmail).string().null())
                        .col(
                            ColumnDef::new(Warehouses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::IsDefault)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Warehouses::AllowNegativeStock)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Warehouses::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Warehouses::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_warehouses_is_default")
                        .table(Warehouses::Table)
                        .col(Warehouses::IsDefault)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Warehouses {
        Table,
        Id,
        Name,
        Code,
        Address,
        ContactName,
        ContactPhone,
        ContactEmail,
        IsActive,
        IsDefault,
        AllowNegativeStock,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_items_table {

    use super::m20240101_000001_create_warehouses_table::Warehouses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockItems::WarehouseId).integer().null())
                        .col(
                            ColumnDef::new(StockItems::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReservedQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockItems::LowStockThreshold)
                                .integer()
                                .not_null()
                                .default(10),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReorderPoint)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(
                            ColumnDef::new(StockItems::ReorderQuantity)
                                .integer()
                                .not_null()
                                .default(50),
                        )
                        .col(
                            ColumnDef::new(StockItems::UnitCost)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockItems::LastRestockedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(StockItems::LastSoldAt).timestamp().null())
                        .col(ColumnDef::new(StockItems::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(StockItems::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_items_warehouse")
                                .from(StockItems::Table, StockItems::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_product_warehouse")
                        .table(StockItems::Table)
                        .col(StockItems::ProductId)
                        .col(StockItems::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_items_warehouse_quantity")
                        .table(StockItems::Table)
                        .col(StockItems::WarehouseId)
                        .col(StockItems::Quantity)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockItems {
        Table,
        Id,
        ProductId,
        WarehouseId,
        Quantity,
        ReservedQuantity,
        LowStockThreshold,
        ReorderPoint,
        ReorderQuantity,
        UnitCost,
        LastRestockedAt,
        LastSoldAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_stock_movements_table {

    use super::m20240101_000002_create_stock_items_table::StockItems;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::StockItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityBefore)
                                .integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityAfter)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().not_null())
                        .col(ColumnDef::new(StockMovements::Reference).string().null())
                        .col(ColumnDef::new(StockMovements::Notes).string().null())
                        .col(
                            ColumnDef::new(StockMovements::UnitCost)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::CreatedBy).string().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_movements_stock_item")
                                .from(StockMovements::Table, StockMovements::StockItemId)
                                .to(StockItems::Table, StockItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_stock_item_created")
                        .table(StockMovements::Table)
                        .col(StockMovements::StockItemId)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_reason_created")
                        .table(StockMovements::Table)
                        .col(StockMovements::Reason)
                        .col(StockMovements::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_movements_reference")
                        .table(StockMovements::Table)
                        .col(StockMovements::Reference)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockMovements {
        Table,
        Id,
        StockItemId,
        MovementType,
        QuantityChange,
        QuantityBefore,
        QuantityAfter,
        Reason,
        Reference,
        Notes,
        UnitCost,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000004_create_stock_alerts_table {

    use super::m20240101_000002_create_stock_items_table::StockItems;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_stock_alerts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAlerts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAlerts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockAlerts::StockItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAlerts::AlertType).string().not_null())
                        .col(
                            ColumnDef::new(StockAlerts::Threshold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockAlerts::CurrentQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAlerts::IsResolved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockAlerts::ResolvedAt).timestamp().null())
                        .col(ColumnDef::new(StockAlerts::ResolvedBy).string().null())
                        .col(ColumnDef::new(StockAlerts::Notes).string().null())
                        .col(
                            ColumnDef::new(StockAlerts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAlerts::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_alerts_stock_item")
                                .from(StockAlerts::Table, StockAlerts::StockItemId)
                                .to(StockItems::Table, StockItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_alerts_open")
                        .table(StockAlerts::Table)
                        .col(StockAlerts::StockItemId)
                        .col(StockAlerts::AlertType)
                        .col(StockAlerts::IsResolved)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAlerts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockAlerts {
        Table,
        Id,
        StockItemId,
        AlertType,
        Threshold,
        CurrentQuantity,
        IsResolved,
        ResolvedAt,
        ResolvedBy,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_inventory_counts_table {

    use super::m20240101_000001_create_warehouses_table::Warehouses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_inventory_counts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryCounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryCounts::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryCounts::WarehouseId)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::Name).string().not_null())
                        .col(ColumnDef::new(InventoryCounts::Status).string().not_null())
                        .col(ColumnDef::new(InventoryCounts::StartedAt).timestamp().null())
                        .col(
                            ColumnDef::new(InventoryCounts::CompletedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::CreatedBy).string().null())
                        .col(ColumnDef::new(InventoryCounts::Notes).string().null())
                        .col(
                            ColumnDef::new(InventoryCounts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryCounts::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_counts_warehouse")
                                .from(InventoryCounts::Table, InventoryCounts::WarehouseId)
                                .to(Warehouses::Table, Warehouses::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryCounts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum InventoryCounts {
        Table,
        Id,
        WarehouseId,
        Name,
        Status,
        StartedAt,
        CompletedAt,
        CreatedBy,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_inventory_count_items_table {

    use super::m20240101_000002_create_stock_items_table::StockItems;
    use super::m20240101_000005_create_inventory_counts_table::InventoryCounts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_inventory_count_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryCountItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryCountItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::InventoryCountId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::StockItemId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::SystemQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::CountedQuantity)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(InventoryCountItems::Notes).string().null())
                        .col(
                            ColumnDef::new(InventoryCountItems::CountedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::CountedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(InventoryCountItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_count_items_count")
                                .from(
                                    InventoryCountItems::Table,
                                    InventoryCountItems::InventoryCountId,
                                )
                                .to(InventoryCounts::Table, InventoryCounts::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_count_items_stock_item")
                                .from(
                                    InventoryCountItems::Table,
                                    InventoryCountItems::StockItemId,
                                )
                                .to(StockItems::Table, StockItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_count_items_count_stock")
                        .table(InventoryCountItems::Table)
                        .col(InventoryCountItems::InventoryCountId)
                        .col(InventoryCountItems::StockItemId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryCountItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum InventoryCountItems {
        Table,
        Id,
        InventoryCountId,
        StockItemId,
        SystemQuantity,
        CountedQuantity,
        Notes,
        CountedBy,
        CountedAt,
        CreatedAt,
    }
}
