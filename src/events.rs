use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::stock_movement::MovementType;

/// Events emitted by the services after a state change has committed.
/// Consumers are observers only; nothing in the core depends on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Directory events
    ItemCreated(Uuid),
    WarehouseCreated(Uuid),
    SupplierCreated(Uuid),

    // Inventory events
    MovementRecorded {
        movement_id: Uuid,
        movement_type: MovementType,
        warehouse_id: Uuid,
        item_id: Uuid,
        quantity: Decimal,
        new_quantity: Decimal,
        reference: Option<String>,
    },

    // Shipment events
    ShipmentCreated(Uuid),
    ShipmentStatusChanged {
        shipment_id: Uuid,
        old_status: String,
        new_status: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and reacts to each event. Spawned once at
/// startup; ends when every sender has been dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match event {
            Event::ItemCreated(id) => {
                info!("Item created: {}", id);
            }
            Event::WarehouseCreated(id) => {
                info!("Warehouse created: {}", id);
            }
            Event::SupplierCreated(id) => {
                info!("Supplier created: {}", id);
            }
            Event::MovementRecorded {
                movement_id,
                movement_type,
                warehouse_id,
                item_id,
                quantity,
                new_quantity,
                ref reference,
            } => {
                info!(
                    "Movement {} recorded: {} {} of item {} in warehouse {} (now {}) ref={:?}",
                    movement_id,
                    movement_type,
                    quantity,
                    item_id,
                    warehouse_id,
                    new_quantity,
                    reference
                );
                if new_quantity < Decimal::ZERO {
                    warn!(
                        "Stock below zero: item {} in warehouse {} is at {}",
                        item_id, warehouse_id, new_quantity
                    );
                }
            }
            Event::ShipmentCreated(id) => {
                info!("Shipment created: {}", id);
            }
            Event::ShipmentStatusChanged {
                shipment_id,
                ref old_status,
                ref new_status,
            } => {
                info!(
                    "Shipment {} moved from {} to {}",
                    shipment_id, old_status, new_status
                );
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        drop(rx);

        let result = sender.send(Event::ShipmentCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn events_are_drained_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::ItemCreated(Uuid::new_v4()))
            .await
            .unwrap();
        sender
            .send(Event::WarehouseCreated(Uuid::new_v4()))
            .await
            .unwrap();
        drop(sender);

        // The loop must terminate once all senders are gone
        process_events(rx).await;
    }
}
