use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events published after a balance change has committed.
///
/// Events never fire inside the locked critical section; the service
/// sends them once the owning transaction has committed, so consumers
/// (cache invalidation, notifications) observe only durable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockAdded {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        new_quantity: i32,
    },
    StockAdjusted {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
    },
    StockReserved {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: String,
    },
    StockReleased {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: String,
    },
    SaleConfirmed {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: String,
    },
    StockReturned {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
        reference: String,
    },
    StockDamaged {
        product_id: Uuid,
        warehouse_id: Option<i32>,
        quantity: i32,
    },
    StockTransferred {
        product_id: Uuid,
        from_warehouse_id: i32,
        to_warehouse_id: i32,
        quantity: i32,
    },
    AlertRaised {
        stock_item_id: i32,
        alert_type: String,
        current_quantity: i32,
    },
    AlertResolved {
        stock_item_id: i32,
        resolved_by: Option<String>,
    },
    CountCompleted {
        count_id: Uuid,
        adjustments_applied: u32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. This is the outbound
/// seam for downstream consumers; delivery itself is external to this
/// core.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::AlertRaised {
                stock_item_id,
                alert_type,
                current_quantity,
            } => {
                warn!(
                    stock_item_id = %stock_item_id,
                    alert_type = %alert_type,
                    current_quantity = %current_quantity,
                    "Stock alert raised"
                );
            }
            Event::StockTransferred {
                product_id,
                from_warehouse_id,
                to_warehouse_id,
                quantity,
            } => {
                info!(
                    product_id = %product_id,
                    from = %from_warehouse_id,
                    to = %to_warehouse_id,
                    quantity = %quantity,
                    "Stock transferred"
                );
            }
            other => debug!(event = ?other, "Processed event"),
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_to_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        sender
            .send(Event::StockDamaged {
                product_id: Uuid::new_v4(),
                warehouse_id: None,
                quantity: 3,
            })
            .await
            .expect("send");
        assert!(matches!(
            rx.recv().await,
            Some(Event::StockDamaged { quantity: 3, .. })
        ));
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        let result = sender
            .send(Event::AlertResolved {
                stock_item_id: 1,
                resolved_by: None,
            })
            .await;
        assert!(result.is_err());
    }
}
