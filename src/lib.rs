//! stockledger-api
//!
//! Inventory stock ledger and reservation engine: concurrency-safe
//! balances per (product, warehouse), temporary holds for pending
//! orders, an append-only movement ledger, derived stock alerts, and a
//! cycle-count reconciliation workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use catalog::ProductCatalog;
use events::EventSender;
use services::{
    alerts::AlertService, counts::CountService, reports::ReportService, stock::StockService,
    warehouses::WarehouseService,
};

pub use handlers::api_v1_routes;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub catalog: Arc<dyn ProductCatalog>,
    pub stock_service: StockService,
    pub alert_service: AlertService,
    pub count_service: CountService,
    pub warehouse_service: WarehouseService,
    pub report_service: ReportService,
}

impl AppState {
    /// Wires every service against one pool, event channel, and catalog
    /// collaborator.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: EventSender,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        let stock_service = StockService::new(
            db.clone(),
            event_sender.clone(),
            catalog.clone(),
            config.lock_wait_timeout(),
        );
        let alert_service = AlertService::new(db.clone());
        let count_service =
            CountService::new(db.clone(), stock_service.clone(), event_sender.clone());
        let warehouse_service = WarehouseService::new(db.clone());
        let report_service = ReportService::new(db.clone(), catalog.clone());

        Self {
            db,
            config,
            event_sender,
            catalog,
            stock_service,
            alert_service,
            count_service,
            warehouse_service,
            report_service,
        }
    }
}
