mod common;

use common::TestApp;
use stockledger_api::{
    entities::inventory_count::CountStatus,
    errors::ServiceError,
};

#[tokio::test]
async fn cycle_count_posts_variance_adjustments() {
    let app = TestApp::new().await;
    let counts = &app.state.count_service;
    let product_a = app.seed_product(None, 25).await;
    let product_b = app.seed_product(None, 40).await;

    let count = counts
        .create_count("Q3 cycle count", None, None, Some("quarterly"), Some("ops"))
        .await
        .unwrap();
    assert_eq!(count.status, CountStatus::Draft.as_str());
    assert_eq!(count.created_by.as_deref(), Some("ops"));

    let (_, items) = counts.get_count(count.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().any(|i| i.system_quantity == 25));
    assert!(items.iter().any(|i| i.system_quantity == 40));

    let started = counts.start_count(count.id).await.unwrap();
    assert_eq!(started.status, CountStatus::InProgress.as_str());
    assert!(started.started_at.is_some());

    // Physical count finds 20 for the first product, 40 for the second.
    let (_, items) = counts.get_count(count.id).await.unwrap();
    let item_a = items.iter().find(|i| i.system_quantity == 25).unwrap();
    let item_b = items.iter().find(|i| i.system_quantity == 40).unwrap();
    let updated = counts
        .update_count_item(item_a.id, 20, Some("short by five"), Some("counter-1"))
        .await
        .unwrap();
    assert_eq!(updated.variance(), -5);
    assert_eq!(updated.counted_by.as_deref(), Some("counter-1"));
    counts
        .update_count_item(item_b.id, 40, None, Some("counter-1"))
        .await
        .unwrap();

    let completed = counts.complete_count(count.id, true, Some("ops")).await.unwrap();
    assert_eq!(completed.status, CountStatus::Completed.as_str());
    assert!(completed.completed_at.is_some());

    // Only the variance item was adjusted.
    let stock_a = app.state.stock_service.get_stock(product_a, None).await.unwrap();
    let stock_b = app.state.stock_service.get_stock(product_b, None).await.unwrap();
    assert_eq!(stock_a.quantity, 20);
    assert_eq!(stock_b.quantity, 40);
}

#[tokio::test]
async fn dry_run_completion_mutates_no_balance() {
    let app = TestApp::new().await;
    let counts = &app.state.count_service;
    let product = app.seed_product(None, 25).await;

    let count = counts
        .create_count("dry run", None, None, None, None)
        .await
        .unwrap();
    counts.start_count(count.id).await.unwrap();

    let (_, items) = counts.get_count(count.id).await.unwrap();
    counts
        .update_count_item(items[0].id, 11, None, None)
        .await
        .unwrap();

    let completed = counts.complete_count(count.id, false, None).await.unwrap();
    assert_eq!(completed.status, CountStatus::Completed.as_str());

    let stock = app.state.stock_service.get_stock(product, None).await.unwrap();
    assert_eq!(stock.quantity, 25, "count-only mode must not touch balances");
}

#[tokio::test]
async fn terminal_states_never_transition() {
    let app = TestApp::new().await;
    let counts = &app.state.count_service;
    app.seed_product(None, 10).await;

    let count = counts
        .create_count("lifecycle", None, None, None, None)
        .await
        .unwrap();

    // Completing a draft is invalid; it must be started first.
    let err = counts.complete_count(count.id, true, None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BusinessRuleViolation { ref code, .. } if code == "count_not_in_progress"
    ));

    counts.start_count(count.id).await.unwrap();
    counts.complete_count(count.id, true, None).await.unwrap();

    // Double completion carries its own code.
    let err = counts.complete_count(count.id, true, None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BusinessRuleViolation { ref code, .. } if code == "count_already_completed"
    ));

    // A completed session cannot be started, cancelled, or re-counted.
    assert!(counts.start_count(count.id).await.is_err());
    assert!(counts.cancel_count(count.id).await.is_err());
    let (_, items) = counts.get_count(count.id).await.unwrap();
    assert!(matches!(
        counts.update_count_item(items[0].id, 3, None, None).await,
        Err(ServiceError::BusinessRuleViolation { .. })
    ));
}

#[tokio::test]
async fn cancelled_counts_stay_cancelled() {
    let app = TestApp::new().await;
    let counts = &app.state.count_service;
    app.seed_product(None, 10).await;

    let count = counts
        .create_count("to cancel", None, None, None, None)
        .await
        .unwrap();
    let cancelled = counts.cancel_count(count.id).await.unwrap();
    assert_eq!(cancelled.status, CountStatus::Cancelled.as_str());

    assert!(counts.start_count(count.id).await.is_err());
    assert!(counts.complete_count(count.id, true, None).await.is_err());
    assert!(counts.cancel_count(count.id).await.is_err());
}

#[tokio::test]
async fn count_scope_follows_warehouse_and_products() {
    let app = TestApp::new().await;
    let counts = &app.state.count_service;
    let wh_a = app.create_warehouse("A", false).await;
    let wh_b = app.create_warehouse("B", false).await;
    let product_a = app.seed_product(Some(wh_a), 10).await;
    app.seed_product(Some(wh_b), 10).await;

    // Warehouse scope.
    let count = counts
        .create_count("wh A only", Some(wh_a), None, None, None)
        .await
        .unwrap();
    let (_, items) = counts.get_count(count.id).await.unwrap();
    assert_eq!(items.len(), 1);

    // Product scope.
    let count = counts
        .create_count("one product", None, Some(vec![product_a]), None, None)
        .await
        .unwrap();
    let (_, items) = counts.get_count(count.id).await.unwrap();
    assert_eq!(items.len(), 1);

    // Unknown ids are NotFound.
    assert!(matches!(
        counts.get_count(uuid::Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        counts.update_count_item(999_999, 1, None, None).await,
        Err(ServiceError::NotFound(_))
    ));
}
