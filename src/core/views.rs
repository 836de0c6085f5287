//! View models returned by list and detail operations.
//!
//! Each operation maps entity models into one of these explicitly instead of
//! choosing a serializer at runtime. `ViewKind` picks between the list and the
//! detail shape where an entity has both.

use crate::entities::{crew, order, route, station, ticket, train};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which shape a read operation should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Compact rows for collection endpoints
    List,
    /// Expanded single record
    Detail,
}

/// Display name of a route, `"{source}-{destination}"`.
#[must_use]
pub fn route_name(source: &str, destination: &str) -> String {
    format!("{source}-{destination}")
}

/// Station as shown everywhere
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    /// Station id
    pub id: i64,
    /// Station name
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl From<station::Model> for StationView {
    fn from(model: station::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

/// Route row with station names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteListItem {
    /// Route id
    pub id: i64,
    /// Derived `"{source}-{destination}"` name
    pub name: String,
    /// Source station name
    pub source: String,
    /// Destination station name
    pub destination: String,
    /// Distance in kilometres
    pub distance: i32,
}

impl RouteListItem {
    /// Builds the row from a route and the names of its two stations.
    #[must_use]
    pub fn new(model: &route::Model, source: String, destination: String) -> Self {
        Self {
            id: model.id,
            name: route_name(&source, &destination),
            source,
            destination,
            distance: model.distance,
        }
    }
}

/// Full train record, used inside journey details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainView {
    /// Train id
    pub id: i64,
    /// Train name
    pub name: String,
    /// Number of cars
    pub cargo_num: i32,
    /// Seats per car
    pub place_in_cargo: i32,
    /// Train type id
    pub train_type: i64,
}

impl From<&train::Model> for TrainView {
    fn from(model: &train::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            cargo_num: model.cargo_num,
            place_in_cargo: model.place_in_cargo,
            train_type: model.train_type_id,
        }
    }
}

/// Train row with the train type shown by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainListItem {
    /// Train id
    pub id: i64,
    /// Train name
    pub name: String,
    /// Number of cars
    pub cargo_num: i32,
    /// Seats per car
    pub place_in_cargo: i32,
    /// Train type name
    pub train_type: String,
}

/// Crew member reduced to a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewListItem {
    /// Crew id
    pub id: i64,
    /// `"{first_name} {last_name}"`
    pub full_name: String,
}

impl From<&crew::Model> for CrewListItem {
    fn from(model: &crew::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name(),
        }
    }
}

/// Journey with route and train shown by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneySummary {
    /// Journey id
    pub id: i64,
    /// Route display name
    pub route: String,
    /// Train name
    pub train: String,
    /// Scheduled departure
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival
    pub arrival_time: DateTime<Utc>,
}

/// Journey row in collection listings, annotated with remaining seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyListItem {
    /// Route, train and schedule
    #[serde(flatten)]
    pub summary: JourneySummary,
    /// Seats still for sale at the time of the read
    pub tickets_available: i64,
}

/// Single journey with train and crew expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyDetail {
    /// Journey id
    pub id: i64,
    /// Route display name
    pub route: String,
    /// Train running the journey
    pub train: TrainView,
    /// Scheduled departure
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival
    pub arrival_time: DateTime<Utc>,
    /// Assigned crew
    pub crew: Vec<CrewListItem>,
}

/// A journey in either shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JourneyView {
    /// List shape
    List(JourneyListItem),
    /// Detail shape
    Detail(JourneyDetail),
}

/// Ticket inside an order listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketListItem {
    /// Ticket id
    pub id: i64,
    /// Car index
    pub cargo: i32,
    /// Seat index
    pub seat: i32,
    /// Train name
    pub train: String,
    /// Route display name of the journey
    pub journey: String,
}

impl TicketListItem {
    /// Builds the row from a ticket and its journey summary.
    #[must_use]
    pub fn new(model: &ticket::Model, journey: &JourneySummary) -> Self {
        Self {
            id: model.id,
            cargo: model.cargo,
            seat: model.seat,
            train: journey.train.clone(),
            journey: journey.route.clone(),
        }
    }
}

/// Ticket inside an order detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDetail {
    /// Ticket id
    pub id: i64,
    /// Car index
    pub cargo: i32,
    /// Seat index
    pub seat: i32,
    /// Journey the seat is on
    pub journey: JourneySummary,
}

/// Order row in the caller's order listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderListItem {
    /// Order id
    pub id: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Tickets in the order
    pub tickets: Vec<TicketListItem>,
}

/// Single order with journeys expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    /// Order id
    pub id: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Tickets in the order
    pub tickets: Vec<TicketDetail>,
}

impl OrderListItem {
    /// Starts a row for `order` with no tickets attached yet.
    #[must_use]
    pub const fn empty(order: &order::Model) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            tickets: Vec::new(),
        }
    }
}
