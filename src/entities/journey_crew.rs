//! Junction table for the journey to crew many-to-many relation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Journey crew assignment
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journey_crews")]
pub struct Model {
    /// Assigned journey
    #[sea_orm(primary_key, auto_increment = false)]
    pub journey_id: i64,
    /// Assigned crew member
    #[sea_orm(primary_key, auto_increment = false)]
    pub crew_id: i64,
}

/// Both sides of the assignment
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The journey side, removed together with the journey
    #[sea_orm(
        belongs_to = "super::journey::Entity",
        from = "Column::JourneyId",
        to = "super::journey::Column::Id",
        on_delete = "Cascade"
    )]
    Journey,
    /// The crew side
    #[sea_orm(
        belongs_to = "super::crew::Entity",
        from = "Column::CrewId",
        to = "super::crew::Column::Id"
    )]
    Crew,
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journey.def()
    }
}

impl Related<super::crew::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crew.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
