use std::sync::Arc;

use axum::Router;
use stockledger_api::{
    catalog::InMemoryCatalog,
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::warehouses::NewWarehouse,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Harness spinning up the full application state against a file-backed
/// SQLite database with a single-connection pool, which serializes
/// transactions the way row locks do on Postgres.
pub struct TestApp {
    pub state: AppState,
    pub catalog: Arc<InMemoryCatalog>,
    #[allow(dead_code)]
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir");
        let db_path = db_dir.path().join("stockledger_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        // Generous bound so a fully serialized test run never trips it.
        cfg.lock_wait_timeout_secs = 30;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let catalog = Arc::new(InMemoryCatalog::new());
        let state = AppState::new(Arc::new(pool), cfg, event_sender, catalog.clone());

        Self {
            state,
            catalog,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Router mirroring the production composition.
    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(stockledger_api::handlers::health::health_router())
            .nest("/api/v1", stockledger_api::api_v1_routes())
            .with_state(self.state.clone())
    }

    /// Registers a warehouse and returns its id.
    #[allow(dead_code)]
    pub async fn create_warehouse(&self, code: &str, allow_negative_stock: bool) -> i32 {
        self.state
            .warehouse_service
            .create_warehouse(NewWarehouse {
                name: format!("Warehouse {}", code),
                code: code.to_string(),
                address: None,
                contact_name: None,
                contact_phone: None,
                contact_email: None,
                is_default: false,
                allow_negative_stock,
            })
            .await
            .expect("create warehouse")
            .id
    }

    /// Seeds a product with stock and returns its id.
    #[allow(dead_code)]
    pub async fn seed_product(&self, warehouse_id: Option<i32>, quantity: i32) -> Uuid {
        let product_id = Uuid::new_v4();
        self.state
            .stock_service
            .add_stock(product_id, warehouse_id, quantity, None, "SEED", "", None)
            .await
            .expect("seed stock");
        product_id
    }
}
