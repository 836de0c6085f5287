//! Order aggregation - atomic purchase of one or more tickets.
//!
//! An order and all of its tickets are written in a single transaction. Each
//! ticket is validated against its journey's train layout and checked for seat
//! conflicts; the first failure rolls the whole order back. Concurrent purchases
//! of the same seat are settled by the unique index on `tickets`, and a violation
//! of that index is reported as `DuplicateSeat`.

use crate::{
    core::{
        journey::JourneyContext,
        pagination::{Page, PageRequest, PaginationSettings},
        ticket::{SeatBound, ensure_seat_free, validate_ticket},
        views::{OrderDetail, OrderListItem, TicketDetail, TicketListItem},
    },
    entities::{Journey, Order, Ticket, Train, journey, order, ticket, train},
    errors::{Error, Result, is_unique_violation},
};
use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// One seat requested as part of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct TicketRequest {
    /// Journey to travel on
    pub journey_id: i64,
    /// Car index
    pub cargo: i32,
    /// Seat index
    pub seat: i32,
}

impl TicketRequest {
    /// Request for `seat` in `cargo` on `journey_id`.
    #[must_use]
    pub const fn new(journey_id: i64, cargo: i32, seat: i32) -> Self {
        Self {
            journey_id,
            cargo,
            seat,
        }
    }

    const fn conflict(&self) -> Error {
        Error::DuplicateSeat {
            journey_id: self.journey_id,
            cargo: self.cargo,
            seat: self.seat,
        }
    }
}

/// A committed order with its tickets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// The order row
    pub order: order::Model,
    /// Tickets in request order
    pub tickets: Vec<ticket::Model>,
}

async fn train_for_journey(
    txn: &DatabaseTransaction,
    journey_id: i64,
) -> Result<(journey::Model, train::Model)> {
    let (journey, train) = Journey::find_by_id(journey_id)
        .find_also_related(Train)
        .one(txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "journey",
            id: journey_id,
        })?;
    let train = train.ok_or(Error::NotFound {
        entity: "train",
        id: journey.train_id,
    })?;
    Ok((journey, train))
}

/// Maps a rejected ticket write to `DuplicateSeat` when the seat index fired.
fn seat_conflict_or_db(err: DbErr, request: &TicketRequest) -> Error {
    if is_unique_violation(&err) {
        request.conflict()
    } else {
        err.into()
    }
}

/// Writes one ticket row. The unique index on `(journey_id, cargo, seat)`
/// settles races that get past `ensure_seat_free`.
async fn insert_ticket<C>(db: &C, order_id: i64, request: &TicketRequest) -> Result<ticket::Model>
where
    C: ConnectionTrait,
{
    ticket::ActiveModel {
        cargo: Set(request.cargo),
        seat: Set(request.seat),
        journey_id: Set(request.journey_id),
        order_id: Set(order_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| seat_conflict_or_db(e, request))
}

async fn insert_order(
    txn: &DatabaseTransaction,
    user_id: i64,
    requests: &[TicketRequest],
    bound: SeatBound,
) -> Result<PlacedOrder> {
    let order = order::ActiveModel {
        created_at: Set(Utc::now()),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut trains: HashMap<i64, train::Model> = HashMap::new();
    let mut claimed: HashSet<(i64, i32, i32)> = HashSet::new();
    let mut tickets = Vec::with_capacity(requests.len());

    for request in requests {
        if !trains.contains_key(&request.journey_id) {
            let (_, train) = train_for_journey(txn, request.journey_id).await?;
            trains.insert(request.journey_id, train);
        }
        if let Some(train) = trains.get(&request.journey_id) {
            validate_ticket(request.cargo, request.seat, train, bound)?;
        }

        if !claimed.insert((request.journey_id, request.cargo, request.seat)) {
            return Err(request.conflict());
        }
        ensure_seat_free(txn, request.journey_id, request.cargo, request.seat).await?;

        tickets.push(insert_ticket(txn, order.id, request).await?);
    }

    Ok(PlacedOrder { order, tickets })
}

/// Places an order for `user_id` containing every requested ticket, or nothing.
///
/// # Errors
/// * `EmptyOrder` when `requests` is empty
/// * `NotFound` when a journey does not exist
/// * `OutOfRange` when a cargo or seat index falls outside the train layout
/// * `DuplicateSeat` when a seat is already sold or requested twice
pub async fn create_order(
    db: &DatabaseConnection,
    user_id: i64,
    requests: &[TicketRequest],
    bound: SeatBound,
) -> Result<PlacedOrder> {
    if requests.is_empty() {
        return Err(Error::EmptyOrder);
    }

    let txn = db.begin().await?;
    match insert_order(&txn, user_id, requests, bound).await {
        Ok(placed) => {
            // a deferred constraint may still fire at commit; the order holds only
            // the requested seats, so the first one stands in for the conflict
            txn.commit()
                .await
                .map_err(|e| seat_conflict_or_db(e, &requests[0]))?;
            info!(
                "Created order {} for user {} with {} tickets",
                placed.order.id,
                user_id,
                placed.tickets.len()
            );
            Ok(placed)
        }
        Err(e) => {
            txn.rollback().await?;
            warn!("Rejected order for user {}: {}", user_id, e);
            Err(e)
        }
    }
}

async fn find_user_order(
    db: &DatabaseConnection,
    user_id: i64,
    order_id: i64,
) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .filter(order::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "order",
            id: order_id,
        })
}

/// Tickets of the given orders with the context needed to render them.
async fn load_tickets(
    db: &DatabaseConnection,
    order_ids: Vec<i64>,
) -> Result<(Vec<ticket::Model>, HashMap<i64, journey::Model>, JourneyContext)> {
    let tickets = Ticket::find()
        .filter(ticket::Column::OrderId.is_in(order_ids))
        .order_by_asc(ticket::Column::Cargo)
        .order_by_asc(ticket::Column::Seat)
        .all(db)
        .await?;

    let journey_ids: HashSet<i64> = tickets.iter().map(|t| t.journey_id).collect();
    let journeys: Vec<journey::Model> = if journey_ids.is_empty() {
        Vec::new()
    } else {
        Journey::find()
            .filter(journey::Column::Id.is_in(journey_ids))
            .all(db)
            .await?
    };
    let context = JourneyContext::load(db, &journeys).await?;
    let journeys = journeys.into_iter().map(|j| (j.id, j)).collect();

    Ok((tickets, journeys, context))
}

/// Lists the caller's orders, newest first, one page at a time.
pub async fn list_orders(
    db: &DatabaseConnection,
    user_id: i64,
    request: PageRequest,
    settings: &PaginationSettings,
) -> Result<Page<OrderListItem>> {
    let page_size = settings.resolve_page_size(request.page_size);
    let paginator = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .paginate(db, page_size);

    let totals = paginator.num_items_and_pages().await?;
    let index = request.index(totals.number_of_pages)?;
    let orders = paginator.fetch_page(index).await?;
    debug!(
        "Order page {} for user {}: {} of {} orders",
        request.page,
        user_id,
        orders.len(),
        totals.number_of_items
    );

    let (tickets, journeys, context) =
        load_tickets(db, orders.iter().map(|o| o.id).collect()).await?;

    let mut rows: Vec<OrderListItem> = orders.iter().map(OrderListItem::empty).collect();
    let positions: HashMap<i64, usize> = rows.iter().enumerate().map(|(i, r)| (r.id, i)).collect();
    for ticket in &tickets {
        let (Some(&position), Some(journey)) =
            (positions.get(&ticket.order_id), journeys.get(&ticket.journey_id))
        else {
            continue;
        };
        rows[position]
            .tickets
            .push(TicketListItem::new(ticket, &context.summary(journey)));
    }

    Ok(Page {
        items: rows,
        page: request.page,
        page_size,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// One of the caller's orders with each ticket's journey expanded.
pub async fn get_order(db: &DatabaseConnection, user_id: i64, order_id: i64) -> Result<OrderDetail> {
    let order = find_user_order(db, user_id, order_id).await?;
    let (tickets, journeys, context) = load_tickets(db, vec![order.id]).await?;

    Ok(OrderDetail {
        id: order.id,
        created_at: order.created_at,
        tickets: tickets
            .iter()
            .filter_map(|t| {
                journeys.get(&t.journey_id).map(|j| TicketDetail {
                    id: t.id,
                    cargo: t.cargo,
                    seat: t.seat,
                    journey: context.summary(j),
                })
            })
            .collect(),
    })
}

/// Deletes one of the caller's orders and every ticket it owns.
pub async fn delete_order(db: &DatabaseConnection, user_id: i64, order_id: i64) -> Result<()> {
    let order = find_user_order(db, user_id, order_id).await?;

    let txn = db.begin().await?;
    let tickets = Ticket::delete_many()
        .filter(ticket::Column::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Order::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted order {} and {} tickets",
        order.id, tickets.rows_affected
    );
    Ok(())
}
