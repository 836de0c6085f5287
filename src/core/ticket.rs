//! Ticket validation and lookups.
//!
//! A ticket names a cargo and a seat on a journey. Both indices start at 1 and
//! are bounded by the layout of the journey's train. No two tickets may claim the
//! same `(journey, cargo, seat)`; that is checked here before writing and enforced
//! again by the unique index on `tickets`.

use crate::{
    entities::{Ticket, ticket, train},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Upper bound applied to the seat index
///
/// Historically the seat index was checked against the number of cars rather
/// than the seats per car. `CargoCount` keeps that behavior for existing clients;
/// `PlaceInCargo` bounds the seat by the seats in one car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatBound {
    /// `1 <= seat <= cargo_num`
    #[default]
    CargoCount,
    /// `1 <= seat <= place_in_cargo`
    PlaceInCargo,
}

impl SeatBound {
    /// Highest seat index accepted for `train`.
    #[must_use]
    pub const fn max_seat(self, train: &train::Model) -> i32 {
        match self {
            Self::CargoCount => train.cargo_num,
            Self::PlaceInCargo => train.place_in_cargo,
        }
    }
}

/// Checks cargo and seat against the layout of `train`.
pub fn validate_ticket(
    cargo: i32,
    seat: i32,
    train: &train::Model,
    bound: SeatBound,
) -> Result<()> {
    if cargo < 1 || cargo > train.cargo_num {
        return Err(Error::OutOfRange {
            field: "cargo",
            value: cargo,
            min: 1,
            max: train.cargo_num,
        });
    }

    let max_seat = bound.max_seat(train);
    if seat < 1 || seat > max_seat {
        return Err(Error::OutOfRange {
            field: "seat",
            value: seat,
            min: 1,
            max: max_seat,
        });
    }

    Ok(())
}

/// Fails with `DuplicateSeat` when the seat is already sold for the journey.
pub async fn ensure_seat_free<C>(db: &C, journey_id: i64, cargo: i32, seat: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let taken = Ticket::find()
        .filter(ticket::Column::JourneyId.eq(journey_id))
        .filter(ticket::Column::Cargo.eq(cargo))
        .filter(ticket::Column::Seat.eq(seat))
        .one(db)
        .await?;

    if taken.is_some() {
        debug!(
            "Seat {}/{} already sold for journey {}",
            cargo, seat, journey_id
        );
        return Err(Error::DuplicateSeat {
            journey_id,
            cargo,
            seat,
        });
    }
    Ok(())
}

/// All tickets sold for a journey, ordered by cargo then seat.
pub async fn tickets_for_journey(
    db: &DatabaseConnection,
    journey_id: i64,
) -> Result<Vec<ticket::Model>> {
    Ticket::find()
        .filter(ticket::Column::JourneyId.eq(journey_id))
        .order_by_asc(ticket::Column::Cargo)
        .order_by_asc(ticket::Column::Seat)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a ticket by id, returning None if it does not exist.
pub async fn get_ticket_by_id(
    db: &DatabaseConnection,
    ticket_id: i64,
) -> Result<Option<ticket::Model>> {
    Ticket::find_by_id(ticket_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes a single ticket, releasing its seat.
pub async fn delete_ticket(db: &DatabaseConnection, ticket_id: i64) -> Result<()> {
    let result = Ticket::delete_by_id(ticket_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "ticket",
            id: ticket_id,
        });
    }
    info!("Deleted ticket {}", ticket_id);
    Ok(())
}
