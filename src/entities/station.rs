//! Station entity - A named stop with coordinates.
//!
//! Station names are unique. Routes reference stations as source and destination.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Station database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    /// Unique identifier for the station
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Station name, unique across all stations
    #[sea_orm(unique)]
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// Stations have no outgoing references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
