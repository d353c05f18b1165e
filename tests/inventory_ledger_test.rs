mod common;

use assert_matches::assert_matches;
use logistics_api::entities::stock_movement::{self, MovementType};
use logistics_api::errors::ServiceError;
use logistics_api::services::inventory::RecordMovementCommand;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

fn movement(
    movement_type: MovementType,
    warehouse_id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
) -> RecordMovementCommand {
    RecordMovementCommand {
        movement_type,
        warehouse_id,
        item_id,
        quantity,
        reference: None,
        related_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn ledger_equals_signed_sum_of_movements() {
    let app = common::spawn_services(true).await;
    let inventory = &app.services.inventory;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    let steps = [
        (MovementType::In, dec!(10)),
        (MovementType::Out, dec!(4)),
        (MovementType::In, dec!(2.5)),
        (MovementType::Out, dec!(1.5)),
    ];
    let mut expected = Decimal::ZERO;
    for (movement_type, quantity) in steps {
        let receipt = inventory
            .record_movement(movement(movement_type, warehouse, item, quantity))
            .await
            .expect("movement");
        expected += match movement_type {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        };
        assert_eq!(receipt.quantity, expected);
    }

    assert_eq!(
        inventory.get_quantity(warehouse, item).await.unwrap(),
        dec!(7)
    );
}

#[tokio::test]
async fn untouched_pair_reads_as_zero() {
    let app = common::spawn_services(true).await;
    let quantity = app
        .services
        .inventory
        .get_quantity(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(quantity, Decimal::ZERO);
}

#[tokio::test]
async fn rejected_movement_leaves_no_trace() {
    let app = common::spawn_services(true).await;
    let inventory = &app.services.inventory;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    for bad in [dec!(0), dec!(-2)] {
        let result = inventory
            .record_movement(movement(MovementType::In, warehouse, item, bad))
            .await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }

    let persisted = stock_movement::Entity::find()
        .filter(stock_movement::Column::WarehouseId.eq(warehouse))
        .all(&*app.db)
        .await
        .unwrap();
    assert!(persisted.is_empty());
    assert_eq!(
        inventory.get_quantity(warehouse, item).await.unwrap(),
        Decimal::ZERO
    );
}

#[tokio::test]
async fn over_issue_goes_negative_when_permitted() {
    let app = common::spawn_services(true).await;
    let inventory = &app.services.inventory;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    let receipt = inventory
        .record_movement(movement(MovementType::Out, warehouse, item, dec!(3)))
        .await
        .expect("over-issue permitted");
    assert_eq!(receipt.quantity, dec!(-3));
}

#[tokio::test]
async fn over_issue_is_rejected_when_disallowed() {
    let app = common::spawn_services(false).await;
    let inventory = &app.services.inventory;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    inventory
        .record_movement(movement(MovementType::In, warehouse, item, dec!(5)))
        .await
        .expect("seed");

    let result = inventory
        .record_movement(movement(MovementType::Out, warehouse, item, dec!(6)))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    // The rejected movement must not have been persisted either
    let persisted = stock_movement::Entity::find()
        .filter(stock_movement::Column::WarehouseId.eq(warehouse))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(
        inventory.get_quantity(warehouse, item).await.unwrap(),
        dec!(5)
    );

    // An issue the stock can cover still goes through
    let receipt = inventory
        .record_movement(movement(MovementType::Out, warehouse, item, dec!(5)))
        .await
        .expect("exact issue");
    assert_eq!(receipt.quantity, Decimal::ZERO);
}

#[tokio::test]
async fn reversal_appends_a_compensating_movement() {
    let app = common::spawn_services(true).await;
    let inventory = &app.services.inventory;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    let original = inventory
        .record_movement(movement(MovementType::Out, warehouse, item, dec!(4)))
        .await
        .unwrap();
    assert_eq!(original.quantity, dec!(-4));

    let reversal = inventory
        .reverse_movement(original.movement_id)
        .await
        .unwrap();
    assert_eq!(reversal.quantity, Decimal::ZERO);
    assert_ne!(reversal.movement_id, original.movement_id);

    // The log is append-only: both movements exist, the reversal points back
    let rows = inventory.list_movements(Some(warehouse), Some(item), 50).await.unwrap();
    assert_eq!(rows.len(), 2);
    let reversal_row = rows
        .iter()
        .find(|row| row.id == reversal.movement_id)
        .unwrap();
    assert_eq!(reversal_row.movement_type, MovementType::In);
    assert_eq!(reversal_row.related_id, Some(original.movement_id));
}

#[tokio::test]
async fn reversing_unknown_movement_is_not_found() {
    let app = common::spawn_services(true).await;
    let result = app
        .services
        .inventory
        .reverse_movement(Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_deltas_to_one_key_all_land() {
    let app = common::spawn_services(true).await;
    let warehouse = Uuid::new_v4();
    let item = Uuid::new_v4();

    // Every task adds 3 and removes 1; no interleaving may lose an update
    let mut tasks = Vec::new();
    for _ in 0..12 {
        let inventory = app.services.inventory.clone();
        tasks.push(tokio::spawn(async move {
            inventory
                .record_movement(movement(MovementType::In, warehouse, item, dec!(3)))
                .await
                .expect("in");
            inventory
                .record_movement(movement(MovementType::Out, warehouse, item, dec!(1)))
                .await
                .expect("out");
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(
        app.services
            .inventory
            .get_quantity(warehouse, item)
            .await
            .unwrap(),
        dec!(24)
    );

    let log = app
        .services
        .inventory
        .list_movements(Some(warehouse), Some(item), 100)
        .await
        .unwrap();
    assert_eq!(log.len(), 24);
}
