//! Station business logic - create, read, update and delete stations.
//!
//! Station names are unique. A station referenced by a route cannot be deleted.

use crate::{
    core::views::StationView,
    entities::{Route, Station, route, station},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Fields of a station write
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewStation {
    /// Station name, trimmed before storing
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

fn validate(new: &NewStation) -> Result<String> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidValue {
            field: "name",
            message: "station name cannot be empty".to_string(),
        });
    }
    if !new.latitude.is_finite() || !new.longitude.is_finite() {
        return Err(Error::InvalidValue {
            field: "coordinates",
            message: "latitude and longitude must be finite numbers".to_string(),
        });
    }
    Ok(name.to_string())
}

async fn ensure_name_free<C>(db: &C, name: &str, except_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = Station::find().filter(station::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(station::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::DuplicateKey {
            entity: "station",
            key: name.to_string(),
        });
    }
    Ok(())
}

/// Creates a station, rejecting a name that is already taken.
pub async fn create_station<C>(db: &C, new: NewStation) -> Result<station::Model>
where
    C: ConnectionTrait,
{
    let name = validate(&new)?;
    ensure_name_free(db, &name, None).await?;

    let model = station::ActiveModel {
        name: Set(name.clone()),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        ..Default::default()
    };
    let station = model.insert(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::DuplicateKey {
                entity: "station",
                key: name,
            }
        } else {
            e.into()
        }
    })?;

    info!("Created station {} '{}'", station.id, station.name);
    Ok(station)
}

/// Finds a station by its unique ID.
pub async fn get_station_by_id<C>(db: &C, station_id: i64) -> Result<station::Model>
where
    C: ConnectionTrait,
{
    Station::find_by_id(station_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "station",
            id: station_id,
        })
}

/// Finds a station by exact name.
pub async fn get_station_by_name<C>(db: &C, name: &str) -> Result<Option<station::Model>>
where
    C: ConnectionTrait,
{
    Station::find()
        .filter(station::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all stations ordered by name.
pub async fn list_stations(db: &DatabaseConnection) -> Result<Vec<StationView>> {
    let stations = Station::find()
        .order_by_asc(station::Column::Name)
        .all(db)
        .await?;
    Ok(stations.into_iter().map(StationView::from).collect())
}

/// Replaces the fields of an existing station.
pub async fn update_station(
    db: &DatabaseConnection,
    station_id: i64,
    new: NewStation,
) -> Result<station::Model> {
    let name = validate(&new)?;
    let existing = get_station_by_id(db, station_id).await?;
    ensure_name_free(db, &name, Some(station_id)).await?;

    let mut model: station::ActiveModel = existing.into();
    model.name = Set(name.clone());
    model.latitude = Set(new.latitude);
    model.longitude = Set(new.longitude);
    let station = model.update(db).await.map_err(|e| {
        if is_unique_violation(&e) {
            Error::DuplicateKey {
                entity: "station",
                key: name,
            }
        } else {
            e.into()
        }
    })?;

    info!("Updated station {} '{}'", station.id, station.name);
    Ok(station)
}

/// Deletes a station that no route references.
pub async fn delete_station(db: &DatabaseConnection, station_id: i64) -> Result<()> {
    get_station_by_id(db, station_id).await?;

    let referencing = Route::find()
        .filter(
            Condition::any()
                .add(route::Column::SourceId.eq(station_id))
                .add(route::Column::DestinationId.eq(station_id)),
        )
        .count(db)
        .await?;
    if referencing > 0 {
        warn!(
            "Refusing to delete station {}: referenced by {} routes",
            station_id, referencing
        );
        return Err(Error::InUse {
            entity: "station",
            id: station_id,
            referenced_by: "routes",
        });
    }

    Station::delete_by_id(station_id).exec(db).await?;
    debug!("Deleted station {}", station_id);
    Ok(())
}
