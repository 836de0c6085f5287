//! Route entity - A directed source to destination station pair.
//!
//! The ordered `(source_id, destination_id)` pair is unique; the index is created
//! alongside the table in `config::database`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Route database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "routes")]
pub struct Model {
    /// Unique identifier for the route
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Departure station
    pub source_id: i64,
    /// Arrival station
    pub destination_id: i64,
    /// Distance in kilometres, always positive
    pub distance: i32,
}

/// Defines relationships between Route and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Station the route starts from
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::SourceId",
        to = "super::station::Column::Id"
    )]
    Source,
    /// Station the route ends at
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::DestinationId",
        to = "super::station::Column::Id"
    )]
    Destination,
    /// One route is served by many journeys
    #[sea_orm(has_many = "super::journey::Entity")]
    Journeys,
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
