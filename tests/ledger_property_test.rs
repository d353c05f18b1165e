mod common;

use logistics_api::entities::stock_movement::MovementType;
use logistics_api::services::inventory::RecordMovementCommand;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    // For any sequence of movements on one key, the materialized ledger
    // value equals the signed sum of the log in submission order.
    #[test]
    fn ledger_matches_signed_replay(ops in proptest::collection::vec((any::<bool>(), 1u32..500), 1..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let app = common::spawn_services(true).await;
            let warehouse = Uuid::new_v4();
            let item = Uuid::new_v4();

            let mut expected = Decimal::ZERO;
            for (inbound, raw_quantity) in ops {
                let quantity = Decimal::from(raw_quantity);
                let movement_type = if inbound { MovementType::In } else { MovementType::Out };
                let receipt = app
                    .services
                    .inventory
                    .record_movement(RecordMovementCommand {
                        movement_type,
                        warehouse_id: warehouse,
                        item_id: item,
                        quantity,
                        reference: None,
                        related_id: None,
                        notes: None,
                    })
                    .await
                    .expect("movement");

                expected += if inbound { quantity } else { -quantity };
                assert_eq!(receipt.quantity, expected);
            }

            let ledger = app
                .services
                .inventory
                .get_quantity(warehouse, item)
                .await
                .unwrap();
            assert_eq!(ledger, expected);
        });
    }
}
