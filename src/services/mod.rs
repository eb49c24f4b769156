pub mod alerts;
pub mod counts;
pub mod reports;
pub mod stock;
pub mod warehouses;
