//! Route catalog - directed station pairs with a distance.
//!
//! Each ordered `(source, destination)` pair exists at most once. Listings can be
//! narrowed by case-insensitive substrings of the station names.

use crate::{
    core::views::{RouteListItem, route_name},
    entities::{Journey, Route, Station, journey, route, station},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Fields of a route write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewRoute {
    /// Departure station
    pub source_id: i64,
    /// Arrival station
    pub destination_id: i64,
    /// Distance in kilometres
    pub distance: i32,
}

/// Optional name filters for route listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteFilter {
    /// Substring of the source station name
    pub source: Option<String>,
    /// Substring of the destination station name
    pub destination: Option<String>,
}

fn validate_distance(distance: i32) -> Result<()> {
    if distance <= 0 {
        return Err(Error::InvalidValue {
            field: "distance",
            message: format!("must be a positive integer, got {distance}"),
        });
    }
    Ok(())
}

async fn ensure_pair_free<C>(db: &C, new: &NewRoute, except_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = Route::find()
        .filter(route::Column::SourceId.eq(new.source_id))
        .filter(route::Column::DestinationId.eq(new.destination_id));
    if let Some(id) = except_id {
        query = query.filter(route::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::DuplicateRoute {
            source_id: new.source_id,
            destination_id: new.destination_id,
        });
    }
    Ok(())
}

async fn ensure_stations_exist<C>(db: &C, new: &NewRoute) -> Result<()>
where
    C: ConnectionTrait,
{
    for station_id in [new.source_id, new.destination_id] {
        if Station::find_by_id(station_id).one(db).await?.is_none() {
            return Err(Error::NotFound {
                entity: "station",
                id: station_id,
            });
        }
    }
    Ok(())
}

fn duplicate_or_db(err: DbErr, new: &NewRoute) -> Error {
    if is_unique_violation(&err) {
        Error::DuplicateRoute {
            source_id: new.source_id,
            destination_id: new.destination_id,
        }
    } else {
        err.into()
    }
}

/// Creates a route, rejecting a non-positive distance or an existing pair.
pub async fn create_route<C>(db: &C, new: NewRoute) -> Result<route::Model>
where
    C: ConnectionTrait,
{
    validate_distance(new.distance)?;
    ensure_stations_exist(db, &new).await?;
    ensure_pair_free(db, &new, None).await?;

    let model = route::ActiveModel {
        source_id: Set(new.source_id),
        destination_id: Set(new.destination_id),
        distance: Set(new.distance),
        ..Default::default()
    };
    let route = model
        .insert(db)
        .await
        .map_err(|e| duplicate_or_db(e, &new))?;

    info!(
        "Created route {} ({} -> {}, {} km)",
        route.id, route.source_id, route.destination_id, route.distance
    );
    Ok(route)
}

/// Finds a route by id.
pub async fn get_route_by_id<C>(db: &C, route_id: i64) -> Result<route::Model>
where
    C: ConnectionTrait,
{
    Route::find_by_id(route_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "route",
            id: route_id,
        })
}

/// Replaces the fields of a route, re-checking distance and pair uniqueness.
pub async fn update_route(
    db: &DatabaseConnection,
    route_id: i64,
    new: NewRoute,
) -> Result<route::Model> {
    validate_distance(new.distance)?;
    let existing = get_route_by_id(db, route_id).await?;
    ensure_stations_exist(db, &new).await?;
    ensure_pair_free(db, &new, Some(route_id)).await?;

    let mut model: route::ActiveModel = existing.into();
    model.source_id = Set(new.source_id);
    model.destination_id = Set(new.destination_id);
    model.distance = Set(new.distance);
    let route = model
        .update(db)
        .await
        .map_err(|e| duplicate_or_db(e, &new))?;

    info!("Updated route {}", route.id);
    Ok(route)
}

/// Deletes a route that no journey follows.
pub async fn delete_route(db: &DatabaseConnection, route_id: i64) -> Result<()> {
    get_route_by_id(db, route_id).await?;

    let journeys = Journey::find()
        .filter(journey::Column::RouteId.eq(route_id))
        .count(db)
        .await?;
    if journeys > 0 {
        warn!(
            "Refusing to delete route {}: followed by {} journeys",
            route_id, journeys
        );
        return Err(Error::InUse {
            entity: "route",
            id: route_id,
            referenced_by: "journeys",
        });
    }

    Route::delete_by_id(route_id).exec(db).await?;
    info!("Deleted route {}", route_id);
    Ok(())
}

/// Ids of stations whose name contains `needle`, ignoring case.
///
/// Names are folded with Unicode case mapping in Rust; `SQLite`'s `LOWER` and
/// `LIKE` only fold ASCII, which would miss names such as "Київ".
async fn stations_matching<C>(db: &C, needle: &str) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let needle = needle.to_lowercase();
    let stations: Vec<(i64, String)> = Station::find()
        .select_only()
        .column(station::Column::Id)
        .column(station::Column::Name)
        .into_tuple()
        .all(db)
        .await?;

    Ok(stations
        .into_iter()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .map(|(id, _)| id)
        .collect())
}

/// Maps station ids to station names for the given routes.
pub(crate) async fn station_names<C>(
    db: &C,
    routes: &[route::Model],
) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    let ids: Vec<i64> = routes
        .iter()
        .flat_map(|r| [r.source_id, r.destination_id])
        .collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let stations = Station::find()
        .filter(station::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(stations.into_iter().map(|s| (s.id, s.name)).collect())
}

/// Maps route ids to their `"{source}-{destination}"` display names.
pub(crate) async fn route_names<C>(
    db: &C,
    routes: &[route::Model],
) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    let names = station_names(db, routes).await?;
    Ok(routes
        .iter()
        .map(|r| {
            let source = names.get(&r.source_id).map_or("", String::as_str);
            let destination = names.get(&r.destination_id).map_or("", String::as_str);
            (r.id, route_name(source, destination))
        })
        .collect())
}

/// Lists routes, optionally narrowed by source and destination name substrings.
///
/// Empty filter strings are ignored. Rows are ordered by source, destination
/// and distance.
pub async fn list_routes(
    db: &DatabaseConnection,
    filter: &RouteFilter,
) -> Result<Vec<RouteListItem>> {
    let mut query = Route::find();

    if let Some(source) = filter.source.as_deref().filter(|s| !s.is_empty()) {
        let ids = stations_matching(db, source).await?;
        query = query.filter(route::Column::SourceId.is_in(ids));
    }
    if let Some(destination) = filter.destination.as_deref().filter(|s| !s.is_empty()) {
        let ids = stations_matching(db, destination).await?;
        query = query.filter(route::Column::DestinationId.is_in(ids));
    }

    let routes = query
        .order_by_asc(route::Column::SourceId)
        .order_by_asc(route::Column::DestinationId)
        .order_by_asc(route::Column::Distance)
        .all(db)
        .await?;
    debug!("Route listing matched {} routes", routes.len());

    let names = station_names(db, &routes).await?;
    Ok(routes
        .iter()
        .map(|r| {
            RouteListItem::new(
                r,
                names.get(&r.source_id).cloned().unwrap_or_default(),
                names.get(&r.destination_id).cloned().unwrap_or_default(),
            )
        })
        .collect())
}

/// Single route with station names resolved.
pub async fn get_route_view(db: &DatabaseConnection, route_id: i64) -> Result<RouteListItem> {
    let route = get_route_by_id(db, route_id).await?;
    let names = station_names(db, std::slice::from_ref(&route)).await?;
    Ok(RouteListItem::new(
        &route,
        names.get(&route.source_id).cloned().unwrap_or_default(),
        names.get(&route.destination_id).cloned().unwrap_or_default(),
    ))
}
