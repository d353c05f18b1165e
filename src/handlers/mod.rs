pub mod inventory;
pub mod items;
pub mod shipments;
pub mod suppliers;
pub mod warehouses;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    inventory::InventoryService, items::ItemService, shipments::ShipmentService,
    suppliers::SupplierService, warehouses::WarehouseService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub warehouses: Arc<WarehouseService>,
    pub suppliers: Arc<SupplierService>,
    pub inventory: Arc<InventoryService>,
    pub shipments: Arc<ShipmentService>,
}

impl AppServices {
    /// Build the service container. The shipment service shares the
    /// inventory service so transitions and direct movements go through
    /// the same ledger path.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        allow_negative_stock: bool,
    ) -> Self {
        let inventory =
            InventoryService::new(db_pool.clone(), event_sender.clone(), allow_negative_stock);
        let shipments =
            ShipmentService::new(db_pool.clone(), event_sender.clone(), inventory.clone());

        Self {
            items: Arc::new(ItemService::new(db_pool.clone(), event_sender.clone())),
            warehouses: Arc::new(WarehouseService::new(db_pool.clone(), event_sender.clone())),
            suppliers: Arc::new(SupplierService::new(db_pool, event_sender)),
            inventory: Arc::new(inventory),
            shipments: Arc::new(shipments),
        }
    }
}
