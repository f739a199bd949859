//! Order business logic - The record store over the `taquizas` table.
//!
//! Provides listing, creation, update and deletion of orders keyed by [`OrderId`].
//! The core fields are accepted as raw text: `add_order` and `update_order` perform no
//! type or range validation, so a headcount of `"cincuenta"` is stored as typed. Only the
//! assignment extension validates its numeric input.
//!
//! Every function runs exactly one statement on a connection borrowed from the pool.

use super::MutationOutcome;
use crate::{
    entities::{Order, order},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Row identifier of an order, shared by the primary view and the assignment view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(i64);

impl OrderId {
    /// Wraps a raw row identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw row identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for OrderId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl order::Model {
    /// Typed identifier of this row.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        OrderId(self.id)
    }

    /// The eight core fields of this row.
    #[must_use]
    pub fn fields(&self) -> OrderFields {
        OrderFields {
            requester_name: self.requester_name.clone(),
            event_date: self.event_date.clone(),
            time_slot: self.time_slot.clone(),
            headcount: self.headcount.clone(),
            address: self.address.clone(),
            zone: self.zone.clone(),
            event_type: self.event_type.clone(),
            cost: self.cost.clone(),
        }
    }
}

/// The eight core fields of an order, exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    /// Name of the person requesting the event
    pub requester_name: String,
    /// Event date
    pub event_date: String,
    /// Time slot
    pub time_slot: String,
    /// Expected number of guests
    pub headcount: String,
    /// Delivery address
    pub address: String,
    /// Delivery zone
    pub zone: String,
    /// Kind of event
    pub event_type: String,
    /// Quoted cost
    pub cost: String,
}

impl OrderFields {
    /// Form labels in entry order, shared by the add and edit forms.
    pub const LABELS: [&'static str; 8] = [
        "Requester name",
        "Date",
        "Time",
        "Headcount",
        "Address",
        "Zone",
        "Event type",
        "Cost",
    ];

    /// Field values in the same order as [`Self::LABELS`].
    #[must_use]
    pub fn values(&self) -> [&str; 8] {
        [
            &self.requester_name,
            &self.event_date,
            &self.time_slot,
            &self.headcount,
            &self.address,
            &self.zone,
            &self.event_type,
            &self.cost,
        ]
    }

    /// Builds the fields from values in [`Self::LABELS`] order.
    #[must_use]
    pub fn from_values(values: [String; 8]) -> Self {
        let [
            requester_name,
            event_date,
            time_slot,
            headcount,
            address,
            zone,
            event_type,
            cost,
        ] = values;
        Self {
            requester_name,
            event_date,
            time_slot,
            headcount,
            address,
            zone,
            event_type,
            cost,
        }
    }
}

/// One `(id, requester, comment)` tuple for the sentiment analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentedOrder {
    /// Order the comment belongs to
    pub id: OrderId,
    /// Requester name
    pub requester_name: String,
    /// Comment text
    pub comment: String,
}

/// Retrieves every order in storage order (ascending row identifier).
pub async fn list_orders(db: &DatabaseConnection) -> Result<Vec<order::Model>> {
    Order::find()
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one order by identifier, returning None if it does not exist.
pub async fn get_order(db: &DatabaseConnection, id: OrderId) -> Result<Option<order::Model>> {
    Order::find_by_id(id.get()).one(db).await.map_err(Into::into)
}

/// Inserts a new order from its core fields and returns the stored row.
///
/// No validation is performed on any field; numeric-looking fields such as headcount and
/// cost are stored as typed. Assignment fields and the comment start out empty.
pub async fn add_order(db: &DatabaseConnection, fields: &OrderFields) -> Result<order::Model> {
    let new_order = order::ActiveModel {
        requester_name: Set(fields.requester_name.clone()),
        event_date: Set(fields.event_date.clone()),
        time_slot: Set(fields.time_slot.clone()),
        headcount: Set(fields.headcount.clone()),
        address: Set(fields.address.clone()),
        zone: Set(fields.zone.clone()),
        event_type: Set(fields.event_type.clone()),
        cost: Set(fields.cost.clone()),
        comment: Set(None),
        collaborators: Set(None),
        kg_corn_tortilla: Set(None),
        kg_cheese: Set(None),
        kg_flour_tortilla: Set(None),
        kg_beef: Set(None),
        kg_chorizo: Set(None),
        kg_pork: Set(None),
        kg_onion: Set(None),
        kg_lime: Set(None),
        ..Default::default()
    };

    let created = new_order.insert(db).await?;
    info!(id = created.id, zone = %created.zone, "Order added");
    Ok(created)
}

/// Overwrites the core fields of one order in a single statement.
///
/// Like [`add_order`], nothing is validated. Assignment fields and the comment are left
/// untouched. An identifier that matches no row yields [`MutationOutcome::NotFound`].
pub async fn update_order(
    db: &DatabaseConnection,
    id: OrderId,
    fields: &OrderFields,
) -> Result<MutationOutcome> {
    let result = Order::update_many()
        .col_expr(
            order::Column::RequesterName,
            Expr::value(fields.requester_name.clone()),
        )
        .col_expr(order::Column::EventDate, Expr::value(fields.event_date.clone()))
        .col_expr(order::Column::TimeSlot, Expr::value(fields.time_slot.clone()))
        .col_expr(order::Column::Headcount, Expr::value(fields.headcount.clone()))
        .col_expr(order::Column::Address, Expr::value(fields.address.clone()))
        .col_expr(order::Column::Zone, Expr::value(fields.zone.clone()))
        .col_expr(order::Column::EventType, Expr::value(fields.event_type.clone()))
        .col_expr(order::Column::Cost, Expr::value(fields.cost.clone()))
        .filter(order::Column::Id.eq(id.get()))
        .exec(db)
        .await?;

    let outcome = MutationOutcome::from_rows(result.rows_affected);
    log_outcome("update", id, outcome);
    Ok(outcome)
}

/// Deletes one order. The caller is responsible for confirming with the user first.
pub async fn delete_order(db: &DatabaseConnection, id: OrderId) -> Result<MutationOutcome> {
    let result = Order::delete_by_id(id.get()).exec(db).await?;

    let outcome = MutationOutcome::from_rows(result.rows_affected);
    log_outcome("delete", id, outcome);
    Ok(outcome)
}

/// Sets or clears the customer comment of one order.
///
/// Blank text clears the comment so the order drops out of the sentiment analysis.
pub async fn set_comment(
    db: &DatabaseConnection,
    id: OrderId,
    comment: Option<&str>,
) -> Result<MutationOutcome> {
    let comment = comment
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string);

    let result = Order::update_many()
        .col_expr(order::Column::Comment, Expr::value(comment))
        .filter(order::Column::Id.eq(id.get()))
        .exec(db)
        .await?;

    let outcome = MutationOutcome::from_rows(result.rows_affected);
    log_outcome("set comment", id, outcome);
    Ok(outcome)
}

/// Retrieves `(id, requester, comment)` for every order that has a comment.
pub async fn list_commented_orders(db: &DatabaseConnection) -> Result<Vec<CommentedOrder>> {
    let rows: Vec<(i64, String, Option<String>)> = Order::find()
        .select_only()
        .column(order::Column::Id)
        .column(order::Column::RequesterName)
        .column(order::Column::Comment)
        .filter(order::Column::Comment.is_not_null())
        .order_by_asc(order::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(id, requester_name, comment)| {
            comment.map(|comment| CommentedOrder {
                id: OrderId(id),
                requester_name,
                comment,
            })
        })
        .collect())
}

pub(crate) fn log_outcome(operation: &str, id: OrderId, outcome: MutationOutcome) {
    match outcome {
        MutationOutcome::Applied { rows } => debug!(%id, rows, "{operation} applied"),
        MutationOutcome::NotFound => warn!(%id, "{operation} matched no order"),
    }
}
