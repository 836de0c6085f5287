//! Train type entity - free-text classification of trains (e.g. "Intercity").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Train type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "train_types")]
pub struct Model {
    /// Unique identifier for the train type
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Defines relationships between `TrainType` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One train type classifies many trains
    #[sea_orm(has_many = "super::train::Entity")]
    Trains,
}

impl Related<super::train::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trains.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
