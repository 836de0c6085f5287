//! Unified error type for the booking core.
//!
//! Validation failures are client errors and never fatal. `DuplicateSeat` is the
//! only conflict a caller may retry with different ticket data.

use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

/// All failures surfaced by the booking core
#[derive(Debug, Error)]
pub enum Error {
    /// A natural key (station name, train name) is already taken
    #[error("{entity} with key '{key}' already exists")]
    DuplicateKey {
        /// Entity kind, e.g. `"station"`
        entity: &'static str,
        /// The colliding key value
        key: String,
    },

    /// A route for this ordered station pair already exists
    #[error("route from station {source_id} to station {destination_id} already exists")]
    DuplicateRoute {
        /// Source station id
        source_id: i64,
        /// Destination station id
        destination_id: i64,
    },

    /// A field holds a value outside its domain
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// Departure is not strictly before arrival
    #[error("departure time {departure} must be earlier than arrival time {arrival}")]
    InvalidTimeRange {
        /// Requested departure
        departure: DateTime<Utc>,
        /// Requested arrival
        arrival: DateTime<Utc>,
    },

    /// Cargo or seat index outside the train layout
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// `"cargo"` or `"seat"`
        field: &'static str,
        /// Requested value
        value: i32,
        /// Inclusive lower bound
        min: i32,
        /// Inclusive upper bound
        max: i32,
    },

    /// The seat is already sold for this journey
    #[error("seat {seat} in cargo {cargo} is already taken for journey {journey_id}")]
    DuplicateSeat {
        /// Journey the seat belongs to
        journey_id: i64,
        /// Cargo index
        cargo: i32,
        /// Seat index
        seat: i32,
    },

    /// An order was submitted without tickets
    #[error("an order must contain at least one ticket")]
    EmptyOrder,

    /// Referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// Record cannot be deleted while other records reference it
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    InUse {
        /// Entity kind
        entity: &'static str,
        /// Record id
        id: i64,
        /// Kind of the referencing records
        referenced_by: &'static str,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Datastore failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl Error {
    /// Whether the failure is caused by the request rather than the system.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Database(_))
    }

    /// Whether the caller may retry the same purchase with different seats.
    #[must_use]
    pub const fn is_retryable_conflict(&self) -> bool {
        matches!(self, Self::DuplicateSeat { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// Returns true when the datastore rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
