//! Ticket entity - One seat in one cargo on one journey.
//!
//! `(journey_id, cargo, seat)` is unique; the index is created in `config::database`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier for the ticket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Car index, starting at 1
    pub cargo: i32,
    /// Seat index within the car, starting at 1
    pub seat: i32,
    /// Journey the seat is sold on
    pub journey_id: i64,
    /// Owning order
    pub order_id: i64,
}

/// Defines relationships between Ticket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each ticket is for one journey
    #[sea_orm(
        belongs_to = "super::journey::Entity",
        from = "Column::JourneyId",
        to = "super::journey::Column::Id",
        on_delete = "Cascade"
    )]
    Journey,
    /// Each ticket is owned by one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journey.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
