mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use stockledger_api::services::reports::MovementQuery;
use uuid::Uuid;

#[tokio::test]
async fn stock_lists_bucket_by_threshold() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let reports = &app.state.report_service;

    let healthy = app.seed_product(None, 50).await;
    let low = app.seed_product(None, 40).await;
    let out = app.seed_product(None, 40).await;
    svc.adjust_stock(low, None, 7, None, "", None).await.unwrap();
    svc.adjust_stock(out, None, 0, None, "", None).await.unwrap();

    let low_items = reports.low_stock_items(None, 50).await.unwrap();
    assert_eq!(low_items.len(), 1);
    assert_eq!(low_items[0].product_id, low);

    let out_items = reports.out_of_stock_items(None, 50).await.unwrap();
    assert_eq!(out_items.len(), 1);
    assert_eq!(out_items[0].product_id, out);

    // Reorder point defaults to 5; only the exhausted item sits at it.
    let reorder = reports.reorder_items(None).await.unwrap();
    assert_eq!(reorder.len(), 1);
    assert_eq!(reorder[0].product_id, out);

    // Status filter mirrors the buckets.
    let (in_stock, _) = reports
        .list_stock(None, Some("in"), None, 1, 50)
        .await
        .unwrap();
    assert!(in_stock.iter().any(|i| i.product_id == healthy));
    assert!(!in_stock.iter().any(|i| i.product_id == out));

    let (by_search, total) = reports
        .list_stock(None, None, Some(&healthy.to_string()), 1, 50)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(by_search[0].product_id, healthy);

    // Invalid filters are validation errors.
    assert!(reports.list_stock(None, Some("weird"), None, 1, 50).await.is_err());
    assert!(reports.list_stock(None, None, None, 0, 50).await.is_err());
}

#[tokio::test]
async fn movement_queries_filter_by_reason_and_reference() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let reports = &app.state.report_service;
    let product = app.seed_product(None, 30).await;

    assert!(svc.reserve(product, None, 5, "ORDER-100", None).await.unwrap());
    svc.confirm_sale(product, None, 5, "ORDER-100", None).await.unwrap();
    svc.process_return(product, None, 2, "RET-1", None).await.unwrap();

    let sales = reports
        .movements(MovementQuery {
            product_id: Some(product),
            reason: Some("sale".to_string()),
            days: 1,
            limit: 100,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].quantity_change, -5);

    let by_reference = reports
        .movements(MovementQuery {
            reference: Some("ORDER-100".to_string()),
            days: 1,
            limit: 100,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_reference.len(), 2, "reserve and sale share the reference");

    let summary = reports.movement_summary(1, None).await.unwrap();
    assert_eq!(summary.total_movements, 4);
    let sale_row = summary
        .by_reason
        .iter()
        .find(|r| r.reason == "sale")
        .expect("sale rollup");
    assert_eq!(sale_row.count, 1);
    assert_eq!(sale_row.total_quantity, -5);
}

#[tokio::test]
async fn statistics_aggregate_balances_and_todays_activity() {
    let app = TestApp::new().await;
    let svc = &app.state.stock_service;
    let reports = &app.state.report_service;

    // Costed stock values at the running unit cost.
    let costed = Uuid::new_v4();
    svc.add_stock(costed, None, 10, Some(dec!(100)), "PO-1", "", None)
        .await
        .unwrap();

    // Uncosted stock falls back to the catalog price.
    let priced = Uuid::new_v4();
    app.catalog.set_price(priced, dec!(50));
    svc.add_stock(priced, None, 4, None, "PO-2", "", None)
        .await
        .unwrap();

    let exhausted = app.seed_product(None, 20).await;
    svc.adjust_stock(exhausted, None, 0, None, "", None).await.unwrap();

    assert!(svc.reserve(costed, None, 2, "ORDER-1", None).await.unwrap());
    svc.confirm_sale(costed, None, 2, "ORDER-1", None).await.unwrap();

    let stats = reports.statistics(None).await.unwrap();
    assert_eq!(stats.total_products, 3);
    // 8 * 100 + 4 * 50 + 0
    assert_eq!(stats.total_stock_value, dec!(1000));
    assert_eq!(stats.out_of_stock_count, 1);
    assert_eq!(stats.low_stock_count, 2, "8 and 4 on hand sit at or below 10");
    assert_eq!(stats.in_stock_count, 2);
    assert_eq!(stats.pending_alerts, 3);
    assert_eq!(stats.items_sold_today, 2);
    assert_eq!(stats.items_received_today, 34);
    assert!(stats.movements_today >= 5);
}

#[tokio::test]
async fn statistics_scope_to_a_warehouse() {
    let app = TestApp::new().await;
    let reports = &app.state.report_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    app.seed_product(Some(wh_a), 30).await;
    app.seed_product(Some(wh_b), 40).await;

    let all = reports.statistics(None).await.unwrap();
    assert_eq!(all.total_products, 2);
    assert_eq!(all.items_received_today, 70);

    let only_a = reports.statistics(Some(wh_a)).await.unwrap();
    assert_eq!(only_a.total_products, 1);
    assert_eq!(only_a.items_received_today, 30);
}
