//! Journey entity - One scheduled run of a train over a route.
//!
//! `departure_time < arrival_time` is checked in `core::journey` before every write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Journey database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journeys")]
pub struct Model {
    /// Unique identifier for the journey
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Route travelled
    pub route_id: i64,
    /// Train running the journey
    pub train_id: i64,
    /// Scheduled departure
    pub departure_time: DateTimeUtc,
    /// Scheduled arrival
    pub arrival_time: DateTimeUtc,
}

/// Defines relationships between Journey and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each journey follows one route
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id"
    )]
    Route,
    /// Each journey is run by one train
    #[sea_orm(
        belongs_to = "super::train::Entity",
        from = "Column::TrainId",
        to = "super::train::Column::Id"
    )]
    Train,
    /// Tickets sold for this journey
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
    /// Crew assignments
    #[sea_orm(has_many = "super::journey_crew::Entity")]
    JourneyCrews,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::train::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Train.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::journey_crew::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JourneyCrews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
