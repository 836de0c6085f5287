//! Crew entity - A crew member that can be assigned to journeys.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Crew database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "crews")]
pub struct Model {
    /// Unique identifier for the crew member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl Model {
    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Crew members are linked to journeys through `journey_crews`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Journey assignments of this crew member
    #[sea_orm(has_many = "super::journey_crew::Entity")]
    JourneyCrews,
}

impl Related<super::journey_crew::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JourneyCrews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
