use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Seam to the external product catalog.
///
/// The catalog owns product existence, pricing, and sales counters; this
/// core only consults it for valuation and notifies it of confirmed
/// sales. Calls happen outside any stock-row lock.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Current price for a product, used to value stock that has no
    /// recorded unit cost.
    async fn price(&self, product_id: Uuid) -> Result<Option<Decimal>, ServiceError>;

    /// Increment the product's sold counter after a confirmed sale.
    async fn increment_sold_count(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError>;
}

/// In-process catalog backed by a map. Serves as the default wiring in
/// deployments where the catalog runs in the same process, and as the
/// collaborator double in tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    prices: RwLock<HashMap<Uuid, Decimal>>,
    sold_counts: RwLock<HashMap<Uuid, i64>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, product_id: Uuid, price: Decimal) {
        self.prices
            .write()
            .expect("catalog price lock poisoned")
            .insert(product_id, price);
    }

    pub fn sold_count(&self, product_id: Uuid) -> i64 {
        self.sold_counts
            .read()
            .expect("catalog sold-count lock poisoned")
            .get(&product_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn price(&self, product_id: Uuid) -> Result<Option<Decimal>, ServiceError> {
        Ok(self
            .prices
            .read()
            .expect("catalog price lock poisoned")
            .get(&product_id)
            .copied())
    }

    async fn increment_sold_count(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let mut counts = self
            .sold_counts
            .write()
            .expect("catalog sold-count lock poisoned");
        let entry = counts.entry(product_id).or_insert(0);
        *entry += i64::from(quantity);
        debug!(product_id = %product_id, quantity = %quantity, "Incremented sold count");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn price_lookup_and_sold_counts() {
        let catalog = InMemoryCatalog::new();
        let product = Uuid::new_v4();

        assert_eq!(catalog.price(product).await.unwrap(), None);
        catalog.set_price(product, dec!(19.99));
        assert_eq!(catalog.price(product).await.unwrap(), Some(dec!(19.99)));

        catalog.increment_sold_count(product, 20).await.unwrap();
        catalog.increment_sold_count(product, 5).await.unwrap();
        assert_eq!(catalog.sold_count(product), 25);
    }
}
