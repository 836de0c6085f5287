//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Composite uniqueness that entity
//! attributes cannot express (route pairs and journey seats) is added as explicit
//! unique indexes.

use crate::entities::{
    Crew, Journey, JourneyCrew, Order, Route, RouteColumn, Station, Ticket, TicketColumn, Train,
    TrainType,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use tracing::{debug, info};

/// Used when neither `DATABASE_URL` nor config.toml name a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://rail_booking.sqlite?mode=rwc";

/// Gets the database URL: `DATABASE_URL` first, then the configured value, then the default.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        configured
            .unwrap_or(DEFAULT_DATABASE_URL)
            .to_string()
    })
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all tables and unique indexes if they do not exist yet.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Station).await?;
    create_table(db, &schema, TrainType).await?;
    create_table(db, &schema, Train).await?;
    create_table(db, &schema, Crew).await?;
    create_table(db, &schema, Route).await?;
    create_table(db, &schema, Journey).await?;
    create_table(db, &schema, JourneyCrew).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, Ticket).await?;

    let route_pair = Index::create()
        .name("idx_unique_route_pair")
        .table(Route)
        .col(RouteColumn::SourceId)
        .col(RouteColumn::DestinationId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&route_pair)).await?;

    let journey_seat = Index::create()
        .name("idx_unique_journey_seat")
        .table(Ticket)
        .col(TicketColumn::JourneyId)
        .col(TicketColumn::Cargo)
        .col(TicketColumn::Seat)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&journey_seat)).await?;

    info!("Database tables and unique indexes ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    use super::*;
    use crate::entities::{route, station, ticket};
    use crate::test_utils::*;
    use sea_orm::{ActiveModelTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        create_tables(&db).await?;

        let _: Vec<station::Model> = Station::find().limit(1).all(&db).await?;
        let _: Vec<ticket::Model> = Ticket::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_route_pair_index_enforced() -> Result<()> {
        let db = setup_test_db().await?;
        let (route, _) = create_test_route(&db).await?;

        // bypass the application check and hit the index directly
        let duplicate = route::ActiveModel {
            source_id: Set(route.source_id),
            destination_id: Set(route.destination_id),
            distance: Set(999),
            ..Default::default()
        }
        .insert(&db)
        .await;
        let err = duplicate.expect_err("unique index should reject the pair");
        assert!(crate::errors::is_unique_violation(&err));
        Ok(())
    }

    #[tokio::test]
    async fn test_journey_seat_index_enforced() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        let order = crate::entities::order::ActiveModel {
            created_at: Set(chrono::Utc::now()),
            user_id: Set(TEST_USER),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let seat = || ticket::ActiveModel {
            cargo: Set(1),
            seat: Set(1),
            journey_id: Set(journey.id),
            order_id: Set(order.id),
            ..Default::default()
        };
        seat().insert(&db).await?;
        let err = seat()
            .insert(&db)
            .await
            .expect_err("unique index should reject the seat");
        assert!(crate::errors::is_unique_violation(&err));
        Ok(())
    }

    #[test]
    fn test_default_database_url() {
        assert_eq!(
            get_database_url(Some("sqlite::memory:")),
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
        );
    }
}
