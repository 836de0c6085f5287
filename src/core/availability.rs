//! Seat availability for journeys.
//!
//! Availability is never stored. Every read counts the tickets sold for the journey
//! and subtracts that from the train capacity, so the figure is current as of the
//! query that produced it.

use crate::{
    entities::{Journey, Ticket, Train, ticket},
    errors::{Error, Result},
};
use sea_orm::{QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Remaining capacity of one journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Journey the figures belong to
    pub journey_id: i64,
    /// `cargo_num * place_in_cargo` of the train
    pub capacity: i64,
    /// Tickets sold for the journey
    pub sold: i64,
    /// Seats still for sale, never negative
    pub available: i64,
}

/// Seats left when `sold` tickets exist for a train of `capacity` seats.
///
/// More tickets than seats cannot be produced through the ticket validator. If
/// the data says otherwise the result is clamped to zero and the anomaly logged.
#[must_use]
pub fn available_seats(capacity: i64, sold: i64) -> i64 {
    let remaining = capacity - sold;
    if remaining < 0 {
        warn!(
            "Ticket count {} exceeds train capacity {}; reporting zero seats available",
            sold, capacity
        );
        return 0;
    }
    remaining
}

/// Number of tickets sold for a journey.
pub async fn count_tickets<C>(db: &C, journey_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let sold = Ticket::find()
        .filter(ticket::Column::JourneyId.eq(journey_id))
        .count(db)
        .await?;
    Ok(i64::try_from(sold).unwrap_or(i64::MAX))
}

/// Ticket counts for several journeys with a single grouped query.
///
/// Journeys without tickets are absent from the map.
pub async fn ticket_counts<C>(db: &C, journey_ids: &[i64]) -> Result<HashMap<i64, i64>>
where
    C: ConnectionTrait,
{
    if journey_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, i64)> = Ticket::find()
        .select_only()
        .column(ticket::Column::JourneyId)
        .column_as(ticket::Column::Id.count(), "sold")
        .filter(ticket::Column::JourneyId.is_in(journey_ids.iter().copied()))
        .group_by(ticket::Column::JourneyId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Computes the current availability of one journey.
pub async fn journey_availability<C>(db: &C, journey_id: i64) -> Result<Availability>
where
    C: ConnectionTrait,
{
    let (journey, train) = Journey::find_by_id(journey_id)
        .find_also_related(Train)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "journey",
            id: journey_id,
        })?;
    let train = train.ok_or(Error::NotFound {
        entity: "train",
        id: journey.train_id,
    })?;

    let capacity = train.capacity();
    let sold = count_tickets(db, journey_id).await?;
    let available = available_seats(capacity, sold);
    debug!(
        "Journey {} availability: capacity={}, sold={}, available={}",
        journey_id, capacity, sold, available
    );

    Ok(Availability {
        journey_id,
        capacity,
        sold,
        available,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::order::{TicketRequest, create_order, delete_order};
    use crate::core::ticket::{SeatBound, delete_ticket};
    use crate::test_utils::*;

    #[test]
    fn test_available_seats_arithmetic() {
        assert_eq!(available_seats(100, 0), 100);
        assert_eq!(available_seats(100, 1), 99);
        assert_eq!(available_seats(100, 100), 0);
    }

    #[test]
    fn test_available_seats_clamps_overbooking() {
        assert_eq!(available_seats(4, 6), 0);
    }

    #[tokio::test]
    async fn test_fresh_journey_has_full_capacity() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;

        let availability = journey_availability(&db, journey.id).await?;
        assert_eq!(availability.capacity, 100);
        assert_eq!(availability.sold, 0);
        assert_eq!(availability.available, 100);

        Ok(())
    }

    #[tokio::test]
    async fn test_availability_tracks_ticket_writes() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;

        let placed = create_order(
            &db,
            TEST_USER,
            &[TicketRequest::new(journey.id, 1, 1)],
            SeatBound::default(),
        )
        .await?;
        assert_eq!(journey_availability(&db, journey.id).await?.available, 99);

        let second = create_order(
            &db,
            TEST_USER,
            &[
                TicketRequest::new(journey.id, 1, 2),
                TicketRequest::new(journey.id, 2, 1),
            ],
            SeatBound::default(),
        )
        .await?;
        assert_eq!(journey_availability(&db, journey.id).await?.available, 97);

        delete_ticket(&db, second.tickets[0].id).await?;
        assert_eq!(journey_availability(&db, journey.id).await?.available, 98);

        delete_order(&db, TEST_USER, placed.order.id).await?;
        assert_eq!(journey_availability(&db, journey.id).await?.available, 99);

        Ok(())
    }

    #[tokio::test]
    async fn test_availability_reads_are_stable() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        create_order(
            &db,
            TEST_USER,
            &[TicketRequest::new(journey.id, 3, 4)],
            SeatBound::default(),
        )
        .await?;

        let first = journey_availability(&db, journey.id).await?;
        let second = journey_availability(&db, journey.id).await?;
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_ticket_counts_groups_by_journey() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        let other = create_test_journey_on(&db, journey.route_id, journey.train_id, 2).await?;

        create_order(
            &db,
            TEST_USER,
            &[
                TicketRequest::new(journey.id, 1, 1),
                TicketRequest::new(journey.id, 1, 2),
                TicketRequest::new(other.id, 1, 1),
            ],
            SeatBound::default(),
        )
        .await?;

        let counts = ticket_counts(&db, &[journey.id, other.id]).await?;
        assert_eq!(counts.get(&journey.id), Some(&2));
        assert_eq!(counts.get(&other.id), Some(&1));
        assert!(ticket_counts(&db, &[]).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_availability_unknown_journey() -> Result<()> {
        let db = setup_test_db().await?;
        let result = journey_availability(&db, 404).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "journey",
                id: 404
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_availability_reports_missing_train_id() -> Result<()> {
        let (db, first) = setup_with_journey().await?;
        let journey = create_test_journey_on(&db, first.route_id, first.train_id, 1).await?;
        assert_ne!(journey.id, journey.train_id);
        // orphan the journey; the pool holds a single connection so the pragma sticks
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;
        Train::delete_by_id(journey.train_id).exec(&db).await?;

        let result = journey_availability(&db, journey.id).await;
        match result.unwrap_err() {
            Error::NotFound { entity, id } => {
                assert_eq!(entity, "train");
                assert_eq!(id, journey.train_id);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }
}
