use crate::{
    db::DbPool,
    entities::shipment::{self, ShipmentStatus},
    entities::shipment_line,
    entities::stock_movement::MovementType,
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::{InventoryService, RecordMovementCommand},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Input for creating a shipment
#[derive(Debug, Clone)]
pub struct CreateShipmentCommand {
    pub shipment_no: String,
    pub origin_warehouse_id: Uuid,
    pub destination_warehouse_id: Option<Uuid>,
    pub destination_name: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub lines: Vec<NewShipmentLine>,
}

#[derive(Debug, Clone)]
pub struct NewShipmentLine {
    pub item_id: Uuid,
    pub quantity: Decimal,
}

/// A line whose movement committed during a transition
#[derive(Debug, Clone, Serialize)]
pub struct AppliedLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub movement_id: Uuid,
    pub quantity_on_hand: Decimal,
}

/// A line whose movement failed during a transition. Earlier lines have
/// already committed; there is no cross-line rollback.
#[derive(Debug, Clone, Serialize)]
pub struct FailedLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub error: String,
}

/// Outcome of a status transition, naming exactly which lines moved stock
#[derive(Debug, Clone, Serialize)]
pub struct TransitionReceipt {
    pub status: ShipmentStatus,
    pub applied: Vec<AppliedLine>,
    pub failed: Vec<FailedLine>,
}

impl TransitionReceipt {
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Service owning shipment lifecycle and the status state machine
#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: InventoryService,
}

impl ShipmentService {
    /// Creates a new shipment service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, inventory: InventoryService) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
        }
    }

    /// Creates a shipment in `created` status together with its lines
    #[instrument(skip(self))]
    pub async fn create_shipment(
        &self,
        command: CreateShipmentCommand,
    ) -> Result<Uuid, ServiceError> {
        if command.shipment_no.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "shipment_no must not be empty".into(),
            ));
        }
        if command.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "shipment must have at least one line".into(),
            ));
        }
        if command
            .lines
            .iter()
            .any(|line| line.quantity <= Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "line quantities must be strictly positive".into(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let now = Utc::now();
        let shipment_id = Uuid::new_v4();
        shipment::ActiveModel {
            id: Set(shipment_id),
            shipment_no: Set(command.shipment_no.clone()),
            origin_warehouse_id: Set(command.origin_warehouse_id),
            destination_warehouse_id: Set(command.destination_warehouse_id),
            destination_name: Set(command.destination_name.clone()),
            status: Set(ShipmentStatus::Created),
            carrier: Set(command.carrier.clone()),
            tracking_number: Set(command.tracking_number.clone()),
            shipped_at: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        let lines = command.lines.iter().map(|line| shipment_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            shipment_id: Set(shipment_id),
            item_id: Set(line.item_id),
            quantity: Set(line.quantity),
        });
        shipment_line::Entity::insert_many(lines)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self.event_sender.send(Event::ShipmentCreated(shipment_id)).await {
            warn!("Failed to publish shipment created event: {}", e);
        }

        Ok(shipment_id)
    }

    /// Gets a shipment by ID
    #[instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        shipment_id: Uuid,
    ) -> Result<Option<(shipment::Model, Vec<shipment_line::Model>)>, ServiceError> {
        let db = &*self.db_pool;
        let Some(found) = shipment::Entity::find_by_id(shipment_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let lines = self.lines_of(shipment_id).await?;
        Ok(Some((found, lines)))
    }

    /// Lists shipments, newest first, optionally filtered by status
    #[instrument(skip(self))]
    pub async fn list_shipments(
        &self,
        status: Option<ShipmentStatus>,
        limit: u64,
    ) -> Result<Vec<shipment::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = shipment::Entity::find();
        if let Some(status) = status {
            query = query.filter(shipment::Column::Status.eq(status));
        }

        query
            .order_by_desc(shipment::Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Moves a shipment to `requested` and emits the movements the
    /// transition calls for: one outbound per line from the origin on
    /// `picked`, one inbound per line into the destination on `delivered`
    /// (none when the destination is external). Cancellation performs no
    /// compensating reversal; a shipment cancelled after picking keeps its
    /// outbound movements and stock is corrected manually through the
    /// reverse-movement operation.
    ///
    /// The status write is a compare-and-set against the status read at
    /// decision time: of two racing callers exactly one wins, the other
    /// gets `ConcurrentModification` and may retry. Re-submitting the
    /// current status is rejected as `InvalidTransition`, so movements are
    /// emitted at most once per forward transition.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        shipment_id: Uuid,
        requested: ShipmentStatus,
    ) -> Result<TransitionReceipt, ServiceError> {
        let db = &*self.db_pool;
        let current = shipment::Entity::find_by_id(shipment_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Shipment {} not found", shipment_id))
            })?;

        if !current.status.can_transition_to(requested) {
            return Err(ServiceError::invalid_transition(current.status, requested));
        }

        // Load the lines before touching the status so a read failure
        // cannot leave a transitioned shipment with no movements emitted
        let lines = self.lines_of(shipment_id).await?;

        let now = Utc::now();
        let mut update = shipment::Entity::update_many()
            .col_expr(shipment::Column::Status, Expr::value(requested))
            .col_expr(shipment::Column::UpdatedAt, Expr::value(now));
        if requested == ShipmentStatus::InTransit {
            update = update.col_expr(shipment::Column::ShippedAt, Expr::value(Some(now)));
        }
        if requested == ShipmentStatus::Delivered {
            update = update.col_expr(shipment::Column::DeliveredAt, Expr::value(Some(now)));
        }

        let result = update
            .filter(shipment::Column::Id.eq(shipment_id))
            .filter(shipment::Column::Status.eq(current.status))
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            // The stored status moved between our read and our write
            return match shipment::Entity::find_by_id(shipment_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
            {
                None => Err(ServiceError::NotFound(format!(
                    "Shipment {} not found",
                    shipment_id
                ))),
                Some(_) => Err(ServiceError::ConcurrentModification(shipment_id)),
            };
        }

        let (applied, failed) = match requested {
            ShipmentStatus::Picked => {
                self.emit_line_movements(
                    &current,
                    &lines,
                    MovementType::Out,
                    current.origin_warehouse_id,
                )
                .await
            }
            ShipmentStatus::Delivered => match current.destination_warehouse_id {
                Some(destination) => {
                    self.emit_line_movements(&current, &lines, MovementType::In, destination)
                        .await
                }
                // External destination: goods leave the system
                None => (Vec::new(), Vec::new()),
            },
            _ => (Vec::new(), Vec::new()),
        };

        if let Err(e) = self
            .event_sender
            .send(Event::ShipmentStatusChanged {
                shipment_id,
                old_status: current.status.to_string(),
                new_status: requested.to_string(),
            })
            .await
        {
            warn!("Failed to publish shipment status event: {}", e);
        }

        Ok(TransitionReceipt {
            status: requested,
            applied,
            failed,
        })
    }

    /// Records one movement per line. Lines are independent: a failure on
    /// line N leaves lines 1..N committed, and the caller learns which is
    /// which through the returned pair.
    async fn emit_line_movements(
        &self,
        shipment: &shipment::Model,
        lines: &[shipment_line::Model],
        movement_type: MovementType,
        warehouse_id: Uuid,
    ) -> (Vec<AppliedLine>, Vec<FailedLine>) {
        let mut applied = Vec::new();
        let mut failed = Vec::new();

        for line in lines {
            match self
                .inventory
                .record_movement(RecordMovementCommand {
                    movement_type,
                    warehouse_id,
                    item_id: line.item_id,
                    quantity: line.quantity,
                    reference: Some(shipment.shipment_no.clone()),
                    related_id: Some(shipment.id),
                    notes: None,
                })
                .await
            {
                Ok(receipt) => applied.push(AppliedLine {
                    line_id: line.id,
                    item_id: line.item_id,
                    movement_id: receipt.movement_id,
                    quantity_on_hand: receipt.quantity,
                }),
                Err(e) => {
                    warn!(
                        "Movement for line {} of shipment {} failed: {}",
                        line.id, shipment.id, e
                    );
                    failed.push(FailedLine {
                        line_id: line.id,
                        item_id: line.item_id,
                        error: e.response_message(),
                    });
                }
            }
        }

        (applied, failed)
    }

    async fn lines_of(&self, shipment_id: Uuid) -> Result<Vec<shipment_line::Model>, ServiceError> {
        let db = &*self.db_pool;
        shipment_line::Entity::find()
            .filter(shipment_line::Column::ShipmentId.eq(shipment_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
