use crate::{
    db::DbPool,
    entities::item,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateItemCommand {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub barcode: Option<String>,
    pub weight_kg: Option<f64>,
    pub dimensions_cm: Option<String>,
}

/// Service for managing catalog items
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ItemService {
    /// Creates a new item service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new item. The SKU must be unique.
    #[instrument(skip(self))]
    pub async fn create_item(&self, command: CreateItemCommand) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;

        let existing = item::Entity::find()
            .filter(item::Column::Sku.eq(command.sku.clone()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "An item with SKU '{}' already exists",
                command.sku
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        item::ActiveModel {
            id: Set(id),
            sku: Set(command.sku),
            name: Set(command.name),
            description: Set(command.description),
            unit: Set(command.unit),
            barcode: Set(command.barcode),
            weight_kg: Set(command.weight_kg),
            dimensions_cm: Set(command.dimensions_cm),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self.event_sender.send(Event::ItemCreated(id)).await {
            warn!("Failed to publish item created event: {}", e);
        }

        Ok(id)
    }

    /// Gets an item by ID
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<item::Model>, ServiceError> {
        let db = &*self.db_pool;
        item::Entity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists items, optionally filtered by a search term matching SKU or name
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        search: Option<String>,
        limit: u64,
    ) -> Result<Vec<item::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = item::Entity::find();
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(item::Column::Sku.contains(term.as_str()))
                    .add(item::Column::Name.contains(term.as_str())),
            );
        }

        query
            .order_by_asc(item::Column::Sku)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
