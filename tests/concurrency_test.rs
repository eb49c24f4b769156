mod common;

use common::TestApp;
use uuid::Uuid;

/// N parallel reservations against bounded availability: no successful
/// subset may drive `available` negative.
#[tokio::test]
async fn parallel_reservations_never_oversell() {
    let app = TestApp::new().await;
    let product = app.seed_product(None, 10).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let svc = app.state.stock_service.clone();
        tasks.push(tokio::spawn(async move {
            svc.reserve(product, None, 1, &format!("ORDER-{}", i), None)
                .await
                .unwrap_or(false)
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.expect("task join") {
            successes += 1;
        }
    }

    assert_eq!(
        successes, 10,
        "exactly 10 single-unit reservations should succeed against 10 available"
    );

    let stock = app.state.stock_service.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, 10);
    assert_eq!(stock.available_quantity(), 0);
}

/// With multi-unit holds, at most floor(available / quantity) succeed.
#[tokio::test]
async fn parallel_bulk_reservations_respect_floor() {
    let app = TestApp::new().await;
    let product = app.seed_product(None, 10).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let svc = app.state.stock_service.clone();
        tasks.push(tokio::spawn(async move {
            svc.reserve(product, None, 3, &format!("BULK-{}", i), None)
                .await
                .unwrap_or(false)
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.expect("task join") {
            successes += 1;
        }
    }

    assert_eq!(successes, 3, "floor(10 / 3) holds of 3 units fit");
    let stock = app.state.stock_service.get_stock(product, None).await.unwrap();
    assert_eq!(stock.reserved_quantity, 9);
    assert!(stock.available_quantity() >= 0);
}

/// Opposing concurrent transfers of the same product pair complete
/// without deadlock because lock acquisition is ordered by warehouse id.
#[tokio::test]
async fn opposing_transfers_do_not_deadlock() {
    let app = TestApp::new().await;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product = Uuid::new_v4();

    app.state
        .stock_service
        .add_stock(product, Some(wh_a), 50, None, "SEED-A", "", None)
        .await
        .unwrap();
    app.state
        .stock_service
        .add_stock(product, Some(wh_b), 50, None, "SEED-B", "", None)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let svc = app.state.stock_service.clone();
        let (from, to) = if i % 2 == 0 { (wh_a, wh_b) } else { (wh_b, wh_a) };
        tasks.push(tokio::spawn(async move {
            svc.transfer_stock(product, from, to, 2, "", None).await
        }));
    }

    for task in tasks {
        task.await.expect("task join").expect("transfer");
    }

    // Conservation: transfers only move units between the pair.
    let a = app.state.stock_service.get_stock(product, Some(wh_a)).await.unwrap();
    let b = app.state.stock_service.get_stock(product, Some(wh_b)).await.unwrap();
    assert_eq!(a.quantity + b.quantity, 100);
}
