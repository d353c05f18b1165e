use crate::{
    db::DbPool,
    entities::warehouse,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateWarehouseCommand {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Service for managing warehouses
#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl WarehouseService {
    /// Creates a new warehouse service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new warehouse. The short code must be unique.
    #[instrument(skip(self))]
    pub async fn create_warehouse(
        &self,
        command: CreateWarehouseCommand,
    ) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;

        let existing = warehouse::Entity::find()
            .filter(warehouse::Column::Code.eq(command.code.clone()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "A warehouse with code '{}' already exists",
                command.code
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        warehouse::ActiveModel {
            id: Set(id),
            code: Set(command.code),
            name: Set(command.name),
            address: Set(command.address),
            city: Set(command.city),
            country: Set(command.country),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self.event_sender.send(Event::WarehouseCreated(id)).await {
            warn!("Failed to publish warehouse created event: {}", e);
        }

        Ok(id)
    }

    /// Gets a warehouse by ID
    #[instrument(skip(self))]
    pub async fn get_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Option<warehouse::Model>, ServiceError> {
        let db = &*self.db_pool;
        warehouse::Entity::find_by_id(warehouse_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists warehouses
    #[instrument(skip(self))]
    pub async fn list_warehouses(&self, limit: u64) -> Result<Vec<warehouse::Model>, ServiceError> {
        let db = &*self.db_pool;
        warehouse::Entity::find()
            .order_by_asc(warehouse::Column::Code)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
