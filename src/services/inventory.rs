use crate::{
    db::DbPool,
    entities::stock_level,
    entities::stock_movement::{self, MovementType},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Input for recording a single stock movement
#[derive(Debug, Clone)]
pub struct RecordMovementCommand {
    pub movement_type: MovementType,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub reference: Option<String>,
    pub related_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Outcome of a recorded movement: the movement id and the resulting
/// quantity-on-hand for the touched (warehouse, item) key
#[derive(Debug, Clone, serde::Serialize)]
pub struct MovementReceipt {
    pub movement_id: Uuid,
    pub quantity: Decimal,
}

/// Service owning the movement log and the stock ledger.
///
/// The ledger row for a key is a materialized cache of the movement log:
/// movements are persisted first, the ledger delta second, inside one
/// transaction, so the ledger never runs ahead of the log.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    allow_negative_stock: bool,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, allow_negative_stock: bool) -> Self {
        Self {
            db_pool,
            event_sender,
            allow_negative_stock,
        }
    }

    /// Records an immutable movement and applies its effect to the ledger.
    ///
    /// Fails with `ValidationError` on a non-positive quantity and, when
    /// negative stock is disallowed, with `InsufficientStock` on an
    /// outbound movement that would overdraw the key. On any storage
    /// failure the whole operation rolls back.
    #[instrument(skip(self))]
    pub async fn record_movement(
        &self,
        command: RecordMovementCommand,
    ) -> Result<MovementReceipt, ServiceError> {
        if command.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity must be strictly positive".into(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        // Persist the movement before touching the ledger; the ledger must
        // stay derivable by replaying the log
        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            movement_type: Set(command.movement_type),
            warehouse_id: Set(command.warehouse_id),
            item_id: Set(command.item_id),
            quantity: Set(command.quantity),
            reference: Set(command.reference.clone()),
            related_id: Set(command.related_id),
            notes: Set(command.notes.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let delta = match command.movement_type {
            MovementType::In => command.quantity,
            MovementType::Out => -command.quantity,
        };

        let new_quantity = self
            .apply_delta(&txn, command.warehouse_id, command.item_id, delta)
            .await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::MovementRecorded {
                movement_id: movement.id,
                movement_type: command.movement_type,
                warehouse_id: command.warehouse_id,
                item_id: command.item_id,
                quantity: command.quantity,
                new_quantity,
                reference: command.reference,
            })
            .await
        {
            warn!("Failed to publish movement event: {}", e);
        }

        Ok(MovementReceipt {
            movement_id: movement.id,
            quantity: new_quantity,
        })
    }

    /// Records a compensating movement for an existing one: opposite
    /// direction, same key and quantity, `related_id` pointing back at the
    /// original. The original row is untouched; the log stays append-only.
    #[instrument(skip(self))]
    pub async fn reverse_movement(
        &self,
        movement_id: Uuid,
    ) -> Result<MovementReceipt, ServiceError> {
        let db = &*self.db_pool;
        let original = stock_movement::Entity::find_by_id(movement_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Movement {} not found", movement_id)))?;

        self.record_movement(RecordMovementCommand {
            movement_type: original.movement_type.opposite(),
            warehouse_id: original.warehouse_id,
            item_id: original.item_id,
            quantity: original.quantity,
            reference: original.reference.clone(),
            related_id: Some(original.id),
            notes: Some(format!("reversal of movement {}", original.id)),
        })
        .await
    }

    /// Current quantity-on-hand for a key. Absence of a ledger row is zero,
    /// not an error.
    #[instrument(skip(self))]
    pub async fn get_quantity(
        &self,
        warehouse_id: Uuid,
        item_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        self.quantity_on(&*self.db_pool, warehouse_id, item_id)
            .await
    }

    /// Lists ledger rows, optionally filtered by warehouse and/or item
    #[instrument(skip(self))]
    pub async fn list_stock(
        &self,
        warehouse_id: Option<Uuid>,
        item_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<stock_level::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = stock_level::Entity::find();
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(stock_level::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(item_id) = item_id {
            query = query.filter(stock_level::Column::ItemId.eq(item_id));
        }

        query
            .order_by_desc(stock_level::Column::UpdatedAt)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists the movement log, newest first, optionally filtered by key
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        warehouse_id: Option<Uuid>,
        item_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = stock_movement::Entity::find();
        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(stock_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(item_id) = item_id {
            query = query.filter(stock_movement::Column::ItemId.eq(item_id));
        }

        query
            .order_by_desc(stock_movement::Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Applies a signed delta to the ledger row for a key as one atomic
    /// read-modify-write. Concurrent deltas to the same key serialize at
    /// the storage layer through the upsert on the composite unique index;
    /// there is no in-process locking.
    async fn apply_delta<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        item_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, ServiceError> {
        if delta < Decimal::ZERO && !self.allow_negative_stock {
            return self
                .apply_delta_guarded(conn, warehouse_id, item_id, delta)
                .await;
        }

        let now = Utc::now();
        let row = stock_level::ActiveModel {
            id: Set(Uuid::new_v4()),
            warehouse_id: Set(warehouse_id),
            item_id: Set(item_id),
            quantity: Set(delta),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let updated = stock_level::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    stock_level::Column::WarehouseId,
                    stock_level::Column::ItemId,
                ])
                .value(
                    stock_level::Column::Quantity,
                    Expr::col(stock_level::Column::Quantity).add(delta),
                )
                .value(stock_level::Column::UpdatedAt, Expr::value(now))
                .to_owned(),
            )
            .exec_with_returning(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(updated.quantity)
    }

    /// Conditional variant used when negative stock is disallowed: the
    /// decrement only lands if the row still covers it. A missing row holds
    /// zero, so it can never cover a decrement.
    async fn apply_delta_guarded<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        item_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, ServiceError> {
        let needed = -delta;
        let now = Utc::now();

        let result = stock_level::Entity::update_many()
            .col_expr(
                stock_level::Column::Quantity,
                Expr::col(stock_level::Column::Quantity).add(delta),
            )
            .col_expr(stock_level::Column::UpdatedAt, Expr::value(now))
            .filter(stock_level::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_level::Column::ItemId.eq(item_id))
            .filter(stock_level::Column::Quantity.gte(needed))
            .exec(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "item {} in warehouse {} cannot cover an issue of {}",
                item_id, warehouse_id, needed
            )));
        }

        self.quantity_on(conn, warehouse_id, item_id).await
    }

    async fn quantity_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        warehouse_id: Uuid,
        item_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let entry = stock_level::Entity::find()
            .filter(stock_level::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_level::Column::ItemId.eq(item_id))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(entry.map(|e| e.quantity).unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::DatabaseConnection;
    use tokio::sync::mpsc;

    fn disconnected_service() -> InventoryService {
        let (tx, _rx) = mpsc::channel(8);
        InventoryService::new(
            Arc::new(DatabaseConnection::default()),
            EventSender::new(tx),
            true,
        )
    }

    fn command(quantity: Decimal) -> RecordMovementCommand {
        RecordMovementCommand {
            movement_type: MovementType::In,
            warehouse_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            reference: None,
            related_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_any_storage_access() {
        let svc = disconnected_service();
        let result = svc.record_movement(command(Decimal::ZERO)).await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn negative_quantity_is_rejected_before_any_storage_access() {
        let svc = disconnected_service();
        let result = svc.record_movement(command(dec!(-3.5))).await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }
}
