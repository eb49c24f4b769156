mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use stockledger_api::{
    entities::stock_movement::{MovementReason, MovementType},
    errors::ServiceError,
    services::reports::MovementQuery,
};
use uuid::Uuid;

async fn product_movements(
    app: &TestApp,
    product_id: Uuid,
) -> Vec<stockledger_api::entities::stock_movement::Model> {
    app.state
        .report_service
        .movements(MovementQuery {
            product_id: Some(product_id),
            days: 1,
            limit: 1000,
            ..Default::default()
        })
        .await
        .expect("movement query")
}

#[tokio::test]
async fn reservation_lifecycle() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = Uuid::new_v4();

    // Receive 50 units at cost 1000 onto an empty balance.
    let stock = svc
        .add_stock(product, None, 50, Some(dec!(1000)), "PO-1", "", Some("ops"))
        .await
        .unwrap();
    assert_eq!(stock.quantity, 50);
    assert_eq!(stock.unit_cost, Some(dec!(1000)));
    assert_eq!(stock.available_quantity(), 50);
    assert!(stock.last_restocked_at.is_some());

    let movements = product_movements(&app, product).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::In.as_str());
    assert_eq!(movements[0].quantity_change, 50);
    assert_eq!(movements[0].unit_cost, Some(dec!(1000)));

    // Hold 20 units for an order.
    assert!(svc.reserve(product, None, 20, "ORDER-1", None).await.unwrap());
    let stock = svc.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, 20);
    assert_eq!(stock.available_quantity(), 30);

    // An oversized hold fails with no state change and no ledger entry.
    let before = product_movements(&app, product).await.len();
    assert!(!svc.reserve(product, None, 40, "ORDER-2", None).await.unwrap());
    let stock = svc.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, 20);
    assert_eq!(product_movements(&app, product).await.len(), before);

    // Confirming the sale consumes the hold and notifies the catalog.
    let stock = svc
        .confirm_sale(product, None, 20, "ORDER-1", None)
        .await
        .unwrap();
    assert_eq!(stock.quantity, 30);
    assert_eq!(stock.reserved_quantity, 0);
    assert_eq!(stock.available_quantity(), 30);
    assert!(stock.last_sold_at.is_some());
    assert_eq!(app.catalog.sold_count(product), 20);

    // Absolute adjustment records the signed delta.
    let stock = svc
        .adjust_stock(product, None, 25, Some("cycle_count"), "", None)
        .await
        .unwrap();
    assert_eq!(stock.quantity, 25);
    let movements = product_movements(&app, product).await;
    let adjustment = movements
        .iter()
        .find(|m| m.movement_type == MovementType::Adjustment.as_str())
        .expect("adjustment movement");
    assert_eq!(adjustment.quantity_change, -5);
    assert_eq!(adjustment.quantity_before, Some(30));
    assert_eq!(adjustment.quantity_after, Some(25));
    assert_eq!(adjustment.reason, "cycle_count");

    // Ledger correlation: quantity-affecting entries sum to the balance.
    let quantity_sum: i32 = movements
        .iter()
        .filter(|m| {
            MovementType::from_str(&m.movement_type)
                .map(|t| t.affects_quantity())
                .unwrap_or(false)
        })
        .map(|m| m.quantity_change)
        .sum();
    assert_eq!(quantity_sum, 25);
}

#[tokio::test]
async fn weighted_average_cost_rolls_forward() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = Uuid::new_v4();

    let stock = svc
        .add_stock(product, None, 10, Some(dec!(100)), "PO-1", "", None)
        .await
        .unwrap();
    assert_eq!(stock.unit_cost, Some(dec!(100)));

    let stock = svc
        .add_stock(product, None, 10, Some(dec!(200)), "PO-2", "", None)
        .await
        .unwrap();
    assert_eq!(stock.unit_cost, Some(dec!(150)));

    // Receiving without a cost leaves the running average untouched.
    let stock = svc
        .add_stock(product, None, 5, None, "PO-3", "", None)
        .await
        .unwrap();
    assert_eq!(stock.unit_cost, Some(dec!(150)));
    assert_eq!(stock.quantity, 25);
}

#[tokio::test]
async fn reserve_then_release_restores_prior_hold() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = app.seed_product(None, 30).await;

    let before = svc.get_stock(product, None).await.unwrap().reserved_quantity;
    assert!(svc.reserve(product, None, 8, "ORDER-9", None).await.unwrap());
    let released = svc.release(product, None, 8, "ORDER-9", None).await.unwrap();
    assert_eq!(released, 8);

    let stock = svc.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, before);

    // Exactly two ledger rows for the pair, cancelling each other out.
    let movements = product_movements(&app, product).await;
    let reserve_rows: Vec<_> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Reserve.as_str())
        .collect();
    let release_rows: Vec<_> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Release.as_str())
        .collect();
    assert_eq!(reserve_rows.len(), 1);
    assert_eq!(release_rows.len(), 1);
    assert_eq!(
        reserve_rows[0].quantity_change + release_rows[0].quantity_change,
        0
    );
}

#[tokio::test]
async fn over_release_is_clamped_to_current_hold() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = app.seed_product(None, 30).await;

    assert!(svc.reserve(product, None, 5, "ORDER-2", None).await.unwrap());
    let released = svc.release(product, None, 10, "ORDER-2", None).await.unwrap();
    assert_eq!(released, 5);

    let stock = svc.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, 0);

    // Releasing with no hold is a no-op with no ledger entry.
    let before = product_movements(&app, product).await.len();
    assert_eq!(svc.release(product, None, 4, "ORDER-2", None).await.unwrap(), 0);
    assert_eq!(product_movements(&app, product).await.len(), before);
}

#[tokio::test]
async fn oversell_is_rejected_without_negative_stock_tolerance() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh = app.create_warehouse("MAIN", false).await;
    let product = app.seed_product(Some(wh), 5).await;

    let err = svc
        .confirm_sale(product, Some(wh), 10, "ORDER-3", None)
        .await
        .unwrap_err();
    match err {
        ServiceError::BusinessRuleViolation { code, .. } => assert_eq!(code, "oversell"),
        other => panic!("expected business rule violation, got {:?}", other),
    }

    // Balance untouched by the rejected sale.
    let stock = svc.get_stock(product, Some(wh)).await.unwrap();
    assert_eq!(stock.quantity, 5);
}

#[tokio::test]
async fn negative_stock_warehouse_tolerates_oversell() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh = app.create_warehouse("NEG", true).await;
    let product = app.seed_product(Some(wh), 5).await;

    let stock = svc
        .confirm_sale(product, Some(wh), 8, "ORDER-4", None)
        .await
        .unwrap();
    assert_eq!(stock.quantity, -3);
    assert_eq!(stock.available_quantity(), 0);
}

#[tokio::test]
async fn damage_write_off_is_clamped_and_returns_applied_amount() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = app.seed_product(None, 3).await;

    let deducted = svc
        .mark_damaged(product, None, 10, "dropped pallet", Some("ops"))
        .await
        .unwrap();
    assert_eq!(deducted, 3);

    let stock = svc.get_stock(product, None).await.unwrap();
    assert_eq!(stock.quantity, 0);

    let movements = product_movements(&app, product).await;
    let damage = movements
        .iter()
        .find(|m| m.reason == MovementReason::Damage.as_str())
        .expect("damage movement");
    assert_eq!(damage.quantity_change, -3);
    assert_eq!(damage.created_by.as_deref(), Some("ops"));

    // Nothing left to write off: no-op, no ledger entry.
    let before = product_movements(&app, product).await.len();
    assert_eq!(svc.mark_damaged(product, None, 1, "", None).await.unwrap(), 0);
    assert_eq!(product_movements(&app, product).await.len(), before);
}

#[tokio::test]
async fn returns_add_stock_back_with_return_reason() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = app.seed_product(None, 10).await;

    let stock = svc
        .process_return(product, None, 4, "RET-77", None)
        .await
        .unwrap();
    assert_eq!(stock.quantity, 14);

    let movements = product_movements(&app, product).await;
    let ret = movements
        .iter()
        .find(|m| m.reason == MovementReason::Return.as_str())
        .expect("return movement");
    assert_eq!(ret.quantity_change, 4);
    assert_eq!(ret.reference.as_deref(), Some("RET-77"));
}

#[tokio::test]
async fn unknown_product_paths() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let missing = Uuid::new_v4();

    // Reservation and release treat a missing row as an expected miss.
    assert!(!svc.reserve(missing, None, 1, "ORDER-X", None).await.unwrap());
    assert_eq!(svc.release(missing, None, 1, "ORDER-X", None).await.unwrap(), 0);
    assert!(!svc.check_availability(missing, None, 1).await.unwrap());

    // Everything else raises NotFound.
    assert!(matches!(
        svc.get_stock(missing, None).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.confirm_sale(missing, None, 1, "ORDER-X", None).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.adjust_stock(missing, None, 5, None, "", None).await,
        Err(ServiceError::NotFound(_))
    ));

    // get_or_create materializes an empty balance on first use.
    let created = svc.get_or_create_stock(missing, None).await.unwrap();
    assert_eq!(created.quantity, 0);
    assert_eq!(created.reserved_quantity, 0);
    let again = svc.get_or_create_stock(missing, None).await.unwrap();
    assert_eq!(again.id, created.id);
}

#[tokio::test]
async fn non_positive_quantities_are_validation_errors() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let product = app.seed_product(None, 10).await;

    assert!(matches!(
        svc.reserve(product, None, 0, "ORDER-Z", None).await,
        Err(ServiceError::ValidationError(_))
    ));
    assert!(matches!(
        svc.add_stock(product, None, -5, None, "", "", None).await,
        Err(ServiceError::ValidationError(_))
    ));
}
