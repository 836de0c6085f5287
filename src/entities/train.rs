//! Train entity - A named train with a fixed car layout.
//!
//! Capacity is `cargo_num * place_in_cargo`. Both factors are positive.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Train database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trains")]
pub struct Model {
    /// Unique identifier for the train
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Train name, unique across all trains
    #[sea_orm(unique)]
    pub name: String,
    /// Number of cars (cargos)
    pub cargo_num: i32,
    /// Seats per car
    pub place_in_cargo: i32,
    /// Classification of this train
    pub train_type_id: i64,
}

impl Model {
    /// Total number of seats on the train.
    #[must_use]
    pub fn capacity(&self) -> i64 {
        i64::from(self.cargo_num) * i64::from(self.place_in_cargo)
    }
}

/// Defines relationships between Train and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each train has one train type
    #[sea_orm(
        belongs_to = "super::train_type::Entity",
        from = "Column::TrainTypeId",
        to = "super::train_type::Column::Id"
    )]
    TrainType,
    /// One train runs many journeys
    #[sea_orm(has_many = "super::journey::Entity")]
    Journeys,
}

impl Related<super::train_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainType.def()
    }
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
