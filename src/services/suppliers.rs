use crate::{
    db::DbPool,
    entities::supplier,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateSupplierCommand {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl SupplierService {
    /// Creates a new supplier service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new supplier
    #[instrument(skip(self))]
    pub async fn create_supplier(
        &self,
        command: CreateSupplierCommand,
    ) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;

        let now = Utc::now();
        let id = Uuid::new_v4();
        supplier::ActiveModel {
            id: Set(id),
            name: Set(command.name),
            contact: Set(command.contact),
            email: Set(command.email),
            phone: Set(command.phone),
            address: Set(command.address),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self.event_sender.send(Event::SupplierCreated(id)).await {
            warn!("Failed to publish supplier created event: {}", e);
        }

        Ok(id)
    }

    /// Gets a supplier by ID
    #[instrument(skip(self))]
    pub async fn get_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        let db = &*self.db_pool;
        supplier::Entity::find_by_id(supplier_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists suppliers
    #[instrument(skip(self))]
    pub async fn list_suppliers(&self, limit: u64) -> Result<Vec<supplier::Model>, ServiceError> {
        let db = &*self.db_pool;
        supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
