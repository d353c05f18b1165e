use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Shipment status enumeration.
///
/// Statuses move forward through `created -> picked -> in_transit ->
/// delivered`; `cancelled` is reachable from `created` and `picked` only.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ShipmentStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "picked")]
    Picked,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ShipmentStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    /// Re-submitting the current status is not a transition.
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Created, Picked)
                | (Picked, InTransit)
                | (InTransit, Delivered)
                | (Created, Cancelled)
                | (Picked, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }
}

/// Shipment entity model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Shipment)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shipment_no: String,
    pub origin_warehouse_id: Uuid,
    /// Absent for external shipments; goods leave the system on delivery
    pub destination_warehouse_id: Option<Uuid>,
    pub destination_name: Option<String>,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shipment_line::Entity")]
    ShipmentLine,
}

impl Related<super::shipment_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ShipmentStatus::*;
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(Created, Picked => true)]
    #[test_case(Picked, InTransit => true)]
    #[test_case(InTransit, Delivered => true)]
    #[test_case(Created, Cancelled => true)]
    #[test_case(Picked, Cancelled => true)]
    #[test_case(InTransit, Cancelled => false; "no cancel once in transit")]
    #[test_case(Delivered, Cancelled => false)]
    #[test_case(Created, InTransit => false; "no skipping picked")]
    #[test_case(Created, Delivered => false)]
    #[test_case(Picked, Created => false; "no moving backwards")]
    #[test_case(Delivered, Delivered => false; "terminal stays terminal")]
    #[test_case(Created, Created => false; "same status is not a transition")]
    fn transition_table(from: ShipmentStatus, to: ShipmentStatus) -> bool {
        from.can_transition_to(to)
    }

    #[test]
    fn terminal_states() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Created.is_terminal());
        assert!(!Picked.is_terminal());
        assert!(!InTransit.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(ShipmentStatus::from_str("in_transit").unwrap(), InTransit);
        assert_eq!(ShipmentStatus::from_str("picked").unwrap(), Picked);
        assert!(ShipmentStatus::from_str("teleported").is_err());
        assert_eq!(InTransit.to_string(), "in_transit");
    }
}
