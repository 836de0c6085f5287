//! Journey scheduling - binds a route, a train, a time window and a crew set.
//!
//! Every write re-checks that departure is strictly before arrival, whether the
//! journey is new or an existing one is being changed. Overlapping journeys on
//! the same train are not detected.

use crate::{
    core::{
        availability::{available_seats, count_tickets, ticket_counts},
        route::route_names,
        views::{
            CrewListItem, JourneyDetail, JourneyListItem, JourneySummary, JourneyView, TrainView,
            ViewKind,
        },
    },
    entities::{
        Crew, Journey, JourneyCrew, Route, Ticket, Train, crew, journey, journey_crew, route,
        ticket, train,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Fields of a new journey
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewJourney {
    /// Route travelled
    pub route_id: i64,
    /// Train running the journey
    pub train_id: i64,
    /// Scheduled departure
    pub departure_time: DateTime<Utc>,
    /// Scheduled arrival
    pub arrival_time: DateTime<Utc>,
    /// Assigned crew, duplicates are ignored
    #[serde(default)]
    pub crew_ids: Vec<i64>,
}

/// Partial update of a journey; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JourneyChanges {
    /// New route
    pub route_id: Option<i64>,
    /// New train
    pub train_id: Option<i64>,
    /// New departure
    pub departure_time: Option<DateTime<Utc>>,
    /// New arrival
    pub arrival_time: Option<DateTime<Utc>>,
    /// Replacement crew set
    pub crew_ids: Option<Vec<i64>>,
}

/// Filters for journey listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct JourneyFilter {
    /// Exact route id
    pub route: Option<i64>,
    /// Exact train id
    pub train: Option<i64>,
    /// Journeys departing on or after this date (UTC)
    pub date: Option<NaiveDate>,
}

/// Fails unless `departure` is strictly earlier than `arrival`.
pub fn validate_time_range(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> Result<()> {
    if departure >= arrival {
        return Err(Error::InvalidTimeRange { departure, arrival });
    }
    Ok(())
}

async fn ensure_route_and_train<C>(db: &C, route_id: i64, train_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if Route::find_by_id(route_id).one(db).await?.is_none() {
        return Err(Error::NotFound {
            entity: "route",
            id: route_id,
        });
    }
    if Train::find_by_id(train_id).one(db).await?.is_none() {
        return Err(Error::NotFound {
            entity: "train",
            id: train_id,
        });
    }
    Ok(())
}

/// Replaces the crew set of a journey.
async fn assign_crew<C>(db: &C, journey_id: i64, crew_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    let wanted: BTreeSet<i64> = crew_ids.iter().copied().collect();

    if !wanted.is_empty() {
        let found: BTreeSet<i64> = Crew::find()
            .filter(crew::Column::Id.is_in(wanted.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if let Some(missing) = wanted.difference(&found).next() {
            return Err(Error::NotFound {
                entity: "crew",
                id: *missing,
            });
        }
    }

    JourneyCrew::delete_many()
        .filter(journey_crew::Column::JourneyId.eq(journey_id))
        .exec(db)
        .await?;

    if !wanted.is_empty() {
        let links = wanted.iter().map(|crew_id| journey_crew::ActiveModel {
            journey_id: Set(journey_id),
            crew_id: Set(*crew_id),
        });
        JourneyCrew::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }
    debug!("Journey {} crew set to {:?}", journey_id, wanted);
    Ok(())
}

async fn insert_journey<C>(db: &C, new: &NewJourney) -> Result<journey::Model>
where
    C: ConnectionTrait,
{
    ensure_route_and_train(db, new.route_id, new.train_id).await?;

    let model = journey::ActiveModel {
        route_id: Set(new.route_id),
        train_id: Set(new.train_id),
        departure_time: Set(new.departure_time),
        arrival_time: Set(new.arrival_time),
        ..Default::default()
    };
    let journey = model.insert(db).await?;
    assign_crew(db, journey.id, &new.crew_ids).await?;
    Ok(journey)
}

/// Creates a journey and its crew assignments in one transaction.
pub async fn create_journey(db: &DatabaseConnection, new: NewJourney) -> Result<journey::Model> {
    validate_time_range(new.departure_time, new.arrival_time)?;

    let txn = db.begin().await?;
    match insert_journey(&txn, &new).await {
        Ok(journey) => {
            txn.commit().await?;
            info!(
                "Created journey {} on route {} with train {} ({} - {})",
                journey.id,
                journey.route_id,
                journey.train_id,
                journey.departure_time,
                journey.arrival_time
            );
            Ok(journey)
        }
        Err(e) => {
            txn.rollback().await?;
            warn!("Rejected new journey on route {}: {}", new.route_id, e);
            Err(e)
        }
    }
}

async fn apply_changes<C>(db: &C, journey_id: i64, changes: &JourneyChanges) -> Result<journey::Model>
where
    C: ConnectionTrait,
{
    let existing = get_journey_by_id(db, journey_id).await?;

    let departure = changes.departure_time.unwrap_or(existing.departure_time);
    let arrival = changes.arrival_time.unwrap_or(existing.arrival_time);
    validate_time_range(departure, arrival)?;

    let route_id = changes.route_id.unwrap_or(existing.route_id);
    let train_id = changes.train_id.unwrap_or(existing.train_id);
    ensure_route_and_train(db, route_id, train_id).await?;

    let mut model: journey::ActiveModel = existing.into();
    model.route_id = Set(route_id);
    model.train_id = Set(train_id);
    model.departure_time = Set(departure);
    model.arrival_time = Set(arrival);
    let journey = model.update(db).await?;

    if let Some(crew_ids) = &changes.crew_ids {
        assign_crew(db, journey_id, crew_ids).await?;
    }
    Ok(journey)
}

/// Applies a partial update, re-validating the merged time window.
pub async fn update_journey(
    db: &DatabaseConnection,
    journey_id: i64,
    changes: JourneyChanges,
) -> Result<journey::Model> {
    let txn = db.begin().await?;
    match apply_changes(&txn, journey_id, &changes).await {
        Ok(journey) => {
            txn.commit().await?;
            info!("Updated journey {}", journey_id);
            Ok(journey)
        }
        Err(e) => {
            txn.rollback().await?;
            warn!("Rejected update of journey {}: {}", journey_id, e);
            Err(e)
        }
    }
}

/// Deletes a journey together with its tickets and crew assignments.
pub async fn delete_journey(db: &DatabaseConnection, journey_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    get_journey_by_id(&txn, journey_id).await?;

    let tickets = Ticket::delete_many()
        .filter(ticket::Column::JourneyId.eq(journey_id))
        .exec(&txn)
        .await?;
    JourneyCrew::delete_many()
        .filter(journey_crew::Column::JourneyId.eq(journey_id))
        .exec(&txn)
        .await?;
    Journey::delete_by_id(journey_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted journey {} and {} tickets",
        journey_id, tickets.rows_affected
    );
    Ok(())
}

/// Finds a journey by id.
pub async fn get_journey_by_id<C>(db: &C, journey_id: i64) -> Result<journey::Model>
where
    C: ConnectionTrait,
{
    Journey::find_by_id(journey_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "journey",
            id: journey_id,
        })
}

/// Crew assigned to a journey, ordered by last then first name.
pub async fn crew_for_journey<C>(db: &C, journey_id: i64) -> Result<Vec<crew::Model>>
where
    C: ConnectionTrait,
{
    let crew_ids: Vec<i64> = JourneyCrew::find()
        .filter(journey_crew::Column::JourneyId.eq(journey_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.crew_id)
        .collect();
    if crew_ids.is_empty() {
        return Ok(Vec::new());
    }

    Crew::find()
        .filter(crew::Column::Id.is_in(crew_ids))
        .order_by_asc(crew::Column::LastName)
        .order_by_asc(crew::Column::FirstName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Journeys matching `filter`, ordered by departure.
pub async fn find_journeys<C>(db: &C, filter: &JourneyFilter) -> Result<Vec<journey::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Journey::find();
    if let Some(route_id) = filter.route {
        query = query.filter(journey::Column::RouteId.eq(route_id));
    }
    if let Some(train_id) = filter.train {
        query = query.filter(journey::Column::TrainId.eq(train_id));
    }
    if let Some(date) = filter.date {
        let start_of_day = date.and_time(NaiveTime::MIN).and_utc();
        query = query.filter(journey::Column::DepartureTime.gte(start_of_day));
    }

    query
        .order_by_asc(journey::Column::DepartureTime)
        .order_by_asc(journey::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Route names and trains needed to render a set of journeys.
pub(crate) struct JourneyContext {
    route_names: HashMap<i64, String>,
    trains: HashMap<i64, train::Model>,
}

impl JourneyContext {
    /// Loads everything referenced by `journeys` with one query per table.
    pub(crate) async fn load<C>(db: &C, journeys: &[journey::Model]) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let route_ids: BTreeSet<i64> = journeys.iter().map(|j| j.route_id).collect();
        let train_ids: BTreeSet<i64> = journeys.iter().map(|j| j.train_id).collect();
        if journeys.is_empty() {
            return Ok(Self {
                route_names: HashMap::new(),
                trains: HashMap::new(),
            });
        }

        let routes: Vec<route::Model> = Route::find()
            .filter(route::Column::Id.is_in(route_ids))
            .all(db)
            .await?;
        let trains = Train::find()
            .filter(train::Column::Id.is_in(train_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        Ok(Self {
            route_names: route_names(db, &routes).await?,
            trains,
        })
    }

    pub(crate) fn train(&self, journey: &journey::Model) -> Option<&train::Model> {
        self.trains.get(&journey.train_id)
    }

    pub(crate) fn summary(&self, journey: &journey::Model) -> JourneySummary {
        JourneySummary {
            id: journey.id,
            route: self
                .route_names
                .get(&journey.route_id)
                .cloned()
                .unwrap_or_default(),
            train: self
                .train(journey)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            departure_time: journey.departure_time,
            arrival_time: journey.arrival_time,
        }
    }
}

/// Lists journeys matching `filter`, each annotated with the seats still for sale.
pub async fn list_journeys(
    db: &DatabaseConnection,
    filter: &JourneyFilter,
) -> Result<Vec<JourneyListItem>> {
    let journeys = find_journeys(db, filter).await?;
    let context = JourneyContext::load(db, &journeys).await?;
    let ids: Vec<i64> = journeys.iter().map(|j| j.id).collect();
    let sold = ticket_counts(db, &ids).await?;
    debug!("Journey listing matched {} journeys", journeys.len());

    Ok(journeys
        .iter()
        .map(|j| {
            let capacity = context.train(j).map_or(0, train::Model::capacity);
            JourneyListItem {
                summary: context.summary(j),
                tickets_available: available_seats(capacity, sold.get(&j.id).copied().unwrap_or(0)),
            }
        })
        .collect())
}

/// Single journey with its train and crew expanded.
pub async fn get_journey_detail(db: &DatabaseConnection, journey_id: i64) -> Result<JourneyDetail> {
    let journey = get_journey_by_id(db, journey_id).await?;
    let context = JourneyContext::load(db, std::slice::from_ref(&journey)).await?;
    let train = context.train(&journey).ok_or(Error::NotFound {
        entity: "train",
        id: journey.train_id,
    })?;
    let summary = context.summary(&journey);
    let crew = crew_for_journey(db, journey_id).await?;

    Ok(JourneyDetail {
        id: journey.id,
        route: summary.route,
        train: TrainView::from(train),
        departure_time: journey.departure_time,
        arrival_time: journey.arrival_time,
        crew: crew.iter().map(CrewListItem::from).collect(),
    })
}

/// Renders one journey in the requested shape.
pub async fn journey_view(
    db: &DatabaseConnection,
    kind: ViewKind,
    journey_id: i64,
) -> Result<JourneyView> {
    match kind {
        ViewKind::Detail => get_journey_detail(db, journey_id).await.map(JourneyView::Detail),
        ViewKind::List => {
            let journey = get_journey_by_id(db, journey_id).await?;
            let context = JourneyContext::load(db, std::slice::from_ref(&journey)).await?;
            let capacity = context.train(&journey).map_or(0, train::Model::capacity);
            let sold = count_tickets(db, journey_id).await?;
            Ok(JourneyView::List(JourneyListItem {
                summary: context.summary(&journey),
                tickets_available: available_seats(capacity, sold),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::order::{TicketRequest, create_order};
    use crate::core::ticket::SeatBound;
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_validate_time_range() {
        let departure = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert!(validate_time_range(departure, departure + Duration::minutes(1)).is_ok());
        assert!(matches!(
            validate_time_range(departure, departure),
            Err(Error::InvalidTimeRange { .. })
        ));
        assert!(matches!(
            validate_time_range(departure, departure - Duration::hours(2)),
            Err(Error::InvalidTimeRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_journey_rejects_before_touching_db() -> Result<()> {
        // no query results are configured, so any datastore access would fail differently
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let departure = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let result = create_journey(
            &db,
            NewJourney {
                route_id: 1,
                train_id: 1,
                departure_time: departure,
                arrival_time: departure,
                crew_ids: vec![],
            },
        )
        .await;
        match result.unwrap_err() {
            Error::InvalidTimeRange {
                departure: d,
                arrival: a,
            } => {
                assert_eq!(d, departure);
                assert_eq!(a, departure);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_journey_with_crew() -> Result<()> {
        let (db, route, train) = setup_with_route_and_train().await?;
        let driver = create_test_crew(&db, "Olena", "Pchilka").await?;
        let conductor = create_test_crew(&db, "Mykola", "Lysenko").await?;

        let departure = Utc.with_ymd_and_hms(2024, 6, 10, 7, 30, 0).unwrap();
        let journey = create_journey(
            &db,
            NewJourney {
                route_id: route.id,
                train_id: train.id,
                departure_time: departure,
                arrival_time: departure + Duration::hours(5),
                crew_ids: vec![driver.id, conductor.id, driver.id],
            },
        )
        .await?;

        let crew = crew_for_journey(&db, journey.id).await?;
        let names: Vec<String> = crew.iter().map(crew::Model::full_name).collect();
        assert_eq!(names, vec!["Mykola Lysenko", "Olena Pchilka"]);

        let detail = get_journey_detail(&db, journey.id).await?;
        assert_eq!(detail.route, "A-B");
        assert_eq!(detail.train.name, train.name);
        assert_eq!(detail.crew.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_journey_unknown_references() -> Result<()> {
        let (db, route, train) = setup_with_route_and_train().await?;
        let departure = Utc.with_ymd_and_hms(2024, 6, 10, 7, 30, 0).unwrap();
        let base = NewJourney {
            route_id: route.id,
            train_id: train.id,
            departure_time: departure,
            arrival_time: departure + Duration::hours(1),
            crew_ids: vec![],
        };

        let result = create_journey(
            &db,
            NewJourney {
                route_id: 999,
                ..base.clone()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "route", .. }
        ));

        let result = create_journey(
            &db,
            NewJourney {
                crew_ids: vec![41],
                ..base
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "crew",
                id: 41
            }
        ));

        // nothing half-written is left behind
        assert!(find_journeys(&db, &JourneyFilter::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_journey_revalidates_merged_times() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;

        // moving only the departure past the stored arrival must fail
        let result = update_journey(
            &db,
            journey.id,
            JourneyChanges {
                departure_time: Some(journey.arrival_time + Duration::minutes(1)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTimeRange { .. }
        ));
        assert_eq!(get_journey_by_id(&db, journey.id).await?, journey);

        let later = update_journey(
            &db,
            journey.id,
            JourneyChanges {
                departure_time: Some(journey.departure_time + Duration::days(1)),
                arrival_time: Some(journey.arrival_time + Duration::days(1)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(later.departure_time, journey.departure_time + Duration::days(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_journey_replaces_crew() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        let first = create_test_crew(&db, "A", "One").await?;
        let second = create_test_crew(&db, "B", "Two").await?;

        update_journey(
            &db,
            journey.id,
            JourneyChanges {
                crew_ids: Some(vec![first.id]),
                ..Default::default()
            },
        )
        .await?;
        update_journey(
            &db,
            journey.id,
            JourneyChanges {
                crew_ids: Some(vec![second.id]),
                ..Default::default()
            },
        )
        .await?;

        let crew = crew_for_journey(&db, journey.id).await?;
        assert_eq!(crew, vec![second]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_journeys_filters() -> Result<()> {
        let (db, first) = setup_with_journey().await?;
        let second = create_test_journey_on(&db, first.route_id, first.train_id, 3).await?;

        let other_train = create_test_train(&db, "Other").await?;
        let third = create_test_journey_on(&db, first.route_id, other_train.id, 5).await?;

        let all = list_journeys(&db, &JourneyFilter::default()).await?;
        let ids: Vec<i64> = all.iter().map(|j| j.summary.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);

        let by_train = list_journeys(
            &db,
            &JourneyFilter {
                train: Some(other_train.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_train.len(), 1);
        assert_eq!(by_train[0].summary.train, "Other");

        let by_route = list_journeys(
            &db,
            &JourneyFilter {
                route: Some(first.route_id + 100),
                ..Default::default()
            },
        )
        .await?;
        assert!(by_route.is_empty());

        // the date bound ignores time of day
        let from_second_day = list_journeys(
            &db,
            &JourneyFilter {
                date: Some(second.departure_time.date_naive()),
                ..Default::default()
            },
        )
        .await?;
        let ids: Vec<i64> = from_second_day.iter().map(|j| j.summary.id).collect();
        assert_eq!(ids, vec![second.id, third.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_journeys_reports_availability() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        create_order(
            &db,
            TEST_USER,
            &[TicketRequest::new(journey.id, 1, 1)],
            SeatBound::default(),
        )
        .await?;

        let listed = list_journeys(&db, &JourneyFilter::default()).await?;
        assert_eq!(listed[0].tickets_available, 99);
        assert_eq!(listed[0].summary.route, "A-B");

        match journey_view(&db, ViewKind::List, journey.id).await? {
            JourneyView::List(item) => assert_eq!(item, listed[0]),
            JourneyView::Detail(_) => panic!("expected list view"),
        }
        assert!(matches!(
            journey_view(&db, ViewKind::Detail, journey.id).await?,
            JourneyView::Detail(_)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_journey_cascades_tickets() -> Result<()> {
        let (db, journey) = setup_with_journey().await?;
        let crew = create_test_crew(&db, "C", "Three").await?;
        update_journey(
            &db,
            journey.id,
            JourneyChanges {
                crew_ids: Some(vec![crew.id]),
                ..Default::default()
            },
        )
        .await?;
        let placed = create_order(
            &db,
            TEST_USER,
            &[TicketRequest::new(journey.id, 2, 2)],
            SeatBound::default(),
        )
        .await?;

        delete_journey(&db, journey.id).await?;

        assert!(Ticket::find_by_id(placed.tickets[0].id).one(&db).await?.is_none());
        assert!(crew_for_journey(&db, journey.id).await?.is_empty());
        // the crew member itself survives
        crate::core::crew::get_crew_by_id(&db, crew.id).await?;
        assert!(matches!(
            delete_journey(&db, journey.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));

        Ok(())
    }
}
