mod common;

use common::TestApp;
use stockledger_api::{
    entities::stock_movement::MovementReason,
    errors::ServiceError,
    services::reports::MovementQuery,
};
use uuid::Uuid;

#[tokio::test]
async fn transfer_moves_units_and_writes_paired_ledger_rows() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product = app.seed_product(Some(wh_a), 50).await;

    let (from_stock, to_stock) = svc
        .transfer_stock(product, wh_a, wh_b, 20, "rebalancing", Some("ops"))
        .await
        .unwrap();

    assert_eq!(from_stock.quantity, 30);
    assert_eq!(to_stock.quantity, 20);
    assert_eq!(to_stock.warehouse_id, Some(wh_b));
    assert_eq!(from_stock.quantity + to_stock.quantity, 50);

    let movements = app
        .state
        .report_service
        .movements(MovementQuery {
            product_id: Some(product),
            days: 1,
            limit: 100,
            ..Default::default()
        })
        .await
        .unwrap();

    let out = movements
        .iter()
        .find(|m| m.reason == MovementReason::TransferOut.as_str())
        .expect("transfer_out row");
    let incoming = movements
        .iter()
        .find(|m| m.reason == MovementReason::TransferIn.as_str())
        .expect("transfer_in row");

    assert_eq!(out.quantity_change, -20);
    assert_eq!(out.reference.as_deref(), Some(&*format!("TO:{}", wh_b)));
    assert_eq!(incoming.quantity_change, 20);
    assert_eq!(incoming.reference.as_deref(), Some(&*format!("FROM:{}", wh_a)));
}

#[tokio::test]
async fn transfer_respects_reservations_at_the_source() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product = app.seed_product(Some(wh_a), 20).await;

    // Held units are not transferable.
    assert!(svc.reserve(product, Some(wh_a), 15, "ORDER-1", None).await.unwrap());

    let err = svc
        .transfer_stock(product, wh_a, wh_b, 10, "", None)
        .await
        .unwrap_err();
    match err {
        ServiceError::BusinessRuleViolation { code, message } => {
            assert_eq!(code, "insufficient_stock");
            assert!(message.contains("Available: 5"));
        }
        other => panic!("expected business rule violation, got {:?}", other),
    }

    // The failed transfer changed nothing.
    let stock = svc.get_stock(product, Some(wh_a)).await.unwrap();
    assert_eq!(stock.quantity, 20);
    assert_eq!(stock.reserved_quantity, 15);
}

#[tokio::test]
async fn transfer_validation() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product = app.seed_product(Some(wh_a), 10).await;

    // Same source and destination.
    assert!(matches!(
        svc.transfer_stock(product, wh_a, wh_a, 5, "", None).await,
        Err(ServiceError::BusinessRuleViolation { ref code, .. }) if code == "invalid_transfer"
    ));

    // Unknown source stock.
    assert!(matches!(
        svc.transfer_stock(Uuid::new_v4(), wh_a, wh_b, 5, "", None).await,
        Err(ServiceError::NotFound(_))
    ));

    // Non-positive quantity.
    assert!(matches!(
        svc.transfer_stock(product, wh_a, wh_b, 0, "", None).await,
        Err(ServiceError::ValidationError(_))
    ));
}

#[tokio::test]
async fn transfer_creates_destination_balance_on_first_use() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product = app.seed_product(Some(wh_a), 10).await;

    assert!(matches!(
        svc.get_stock(product, Some(wh_b)).await,
        Err(ServiceError::NotFound(_))
    ));

    svc.transfer_stock(product, wh_a, wh_b, 4, "", None).await.unwrap();
    let dest = svc.get_stock(product, Some(wh_b)).await.unwrap();
    assert_eq!(dest.quantity, 4);

    // Reverse direction locks in the same warehouse-id order and lands
    // back on the original row.
    svc.transfer_stock(product, wh_b, wh_a, 4, "", None).await.unwrap();
    let source = svc.get_stock(product, Some(wh_a)).await.unwrap();
    let dest = svc.get_stock(product, Some(wh_b)).await.unwrap();
    assert_eq!(source.quantity, 10);
    assert_eq!(dest.quantity, 0);
}
