//! Shared test utilities for the booking core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        crew::{NewCrew, create_crew},
        journey::{NewJourney, create_journey},
        route::{NewRoute, create_route},
        station::{NewStation, create_station},
        train::{NewTrain, create_train, create_train_type},
    },
    entities::{crew, journey, route, station, train},
    errors::Result,
};
use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing_subscriber::EnvFilter;

/// User placing most test orders
pub const TEST_USER: i64 = 1;
/// A second user for ownership checks
pub const OTHER_USER: i64 = 2;
/// Name of the train created by `setup_with_route_and_train`
pub const TEST_TRAIN: &str = "Test train";

/// Routes `tracing` output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
///
/// The pool is limited to one connection so every query sees the same
/// in-memory database, and concurrent transactions queue for it.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Station fields with placeholder coordinates.
#[must_use]
pub fn station_args(name: &str) -> NewStation {
    NewStation {
        name: name.to_string(),
        latitude: 50.45,
        longitude: 30.52,
    }
}

/// Train fields for a 10 x 10 layout.
#[must_use]
pub fn train_args(name: &str, train_type_id: i64) -> NewTrain {
    NewTrain {
        name: name.to_string(),
        cargo_num: 10,
        place_in_cargo: 10,
        train_type_id,
    }
}

/// Creates a station with placeholder coordinates.
pub async fn create_test_station(db: &DatabaseConnection, name: &str) -> Result<station::Model> {
    create_station(db, station_args(name)).await
}

/// Creates a train with a custom layout and its own train type.
pub async fn create_custom_train(
    db: &DatabaseConnection,
    name: &str,
    cargo_num: i32,
    place_in_cargo: i32,
) -> Result<train::Model> {
    let train_type = create_train_type(db, "Test type").await?;
    create_train(
        db,
        NewTrain {
            name: name.to_string(),
            cargo_num,
            place_in_cargo,
            train_type_id: train_type.id,
        },
    )
    .await
}

/// Creates a 10 x 10 train (capacity 100).
pub async fn create_test_train(db: &DatabaseConnection, name: &str) -> Result<train::Model> {
    create_custom_train(db, name, 10, 10).await
}

/// Creates a crew member.
pub async fn create_test_crew(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
) -> Result<crew::Model> {
    create_crew(
        db,
        NewCrew {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        },
    )
    .await
}

/// Creates stations "A" and "B" and a 200 km route from A to B.
pub async fn create_test_route(
    db: &DatabaseConnection,
) -> Result<(route::Model, (station::Model, station::Model))> {
    let source = create_test_station(db, "A").await?;
    let destination = create_test_station(db, "B").await?;
    let route = create_route(
        db,
        NewRoute {
            source_id: source.id,
            destination_id: destination.id,
            distance: 200,
        },
    )
    .await?;
    Ok((route, (source, destination)))
}

/// Creates a four hour journey departing at 08:00 UTC on 2024-06-01 plus `day_offset` days.
pub async fn create_test_journey_on(
    db: &DatabaseConnection,
    route_id: i64,
    train_id: i64,
    day_offset: i64,
) -> Result<journey::Model> {
    let departure = Utc
        .with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::days(day_offset);
    create_journey(
        db,
        NewJourney {
            route_id,
            train_id,
            departure_time: departure,
            arrival_time: departure + Duration::hours(4),
            crew_ids: Vec::new(),
        },
    )
    .await
}

/// Sets up a database with route A-B and the 10 x 10 test train.
pub async fn setup_with_route_and_train() -> Result<(DatabaseConnection, route::Model, train::Model)>
{
    let db = setup_test_db().await?;
    let (route, _) = create_test_route(&db).await?;
    let train = create_test_train(&db, TEST_TRAIN).await?;
    Ok((db, route, train))
}

/// Sets up a database with one journey of the test train over route A-B.
pub async fn setup_with_journey() -> Result<(DatabaseConnection, journey::Model)> {
    let (db, route, train) = setup_with_route_and_train().await?;
    let journey = create_test_journey_on(&db, route.id, train.id, 0).await?;
    Ok((db, journey))
}
