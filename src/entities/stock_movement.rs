use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a stock movement. Quantities are always positive; the
/// direction lives here, never in the sign.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MovementType {
    #[sea_orm(string_value = "in")]
    In,
    #[sea_orm(string_value = "out")]
    Out,
}

impl MovementType {
    /// The opposite direction, used when reversing a movement
    pub fn opposite(self) -> Self {
        match self {
            MovementType::In => MovementType::Out,
            MovementType::Out => MovementType::In,
        }
    }
}

/// Immutable stock movement record. The movement log is append-only: no
/// update or delete path exists anywhere in the crate.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = StockMovement)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub movement_type: MovementType,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    /// Strictly positive
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    /// PO/SO/shipment reference number
    pub reference: Option<String>,
    /// Related document id (e.g. shipment id, reversed movement id)
    pub related_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn movement_type_round_trips_through_strings() {
        assert_eq!(MovementType::from_str("in").unwrap(), MovementType::In);
        assert_eq!(MovementType::from_str("OUT").unwrap(), MovementType::Out);
        assert!(MovementType::from_str("sideways").is_err());
        assert_eq!(MovementType::In.to_string(), "in");
        assert_eq!(MovementType::Out.to_string(), "out");
    }

    #[test]
    fn opposite_flips_direction() {
        assert_eq!(MovementType::In.opposite(), MovementType::Out);
        assert_eq!(MovementType::Out.opposite(), MovementType::In);
    }
}
