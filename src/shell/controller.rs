//! Presentation controller.
//!
//! The controller owns the database handle and the row set currently on screen. Each user
//! action is a method; every failure is turned into a [`Notice`] here so that no error
//! escapes to the input loop.

use crate::{
    config::AnalyticsSettings,
    core::{
        MutationOutcome, OrderFields, OrderId,
        assignment::{self, AssignmentForm, AssignmentRow, IngredientInput},
        demand::{self, DemandForecast},
        order,
        segments::{self, SegmentReport},
        sentiment::{self, CommentSentiment, SentimentScorer},
        stats::{self, ZoneReport, parse_number},
    },
    entities,
    errors::Error,
};
use sea_orm::DatabaseConnection;
use std::{cmp::Ordering, fmt, str::FromStr};
use tracing::error;

/// User-facing message produced by a controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The action succeeded
    Info(String),
    /// The action did nothing, e.g. the selected order no longer exists
    Warning(String),
    /// The action failed; the application keeps running
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(message) => write!(f, "✔ {message}"),
            Self::Warning(message) => write!(f, "⚠ {message}"),
            Self::Error(message) => write!(f, "✘ {message}"),
        }
    }
}

fn failure(action: &str, err: &Error) -> Notice {
    error!(error = %err, "{action} failed");
    Notice::Error(format!("{action} failed: {err}"))
}

/// Column of the order table the view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    /// Row identifier
    Id,
    /// Requester name
    RequesterName,
    /// Event date
    Date,
    /// Time slot
    Time,
    /// Headcount
    Headcount,
    /// Address
    Address,
    /// Zone
    Zone,
    /// Event type
    EventType,
    /// Cost
    Cost,
}

impl SortColumn {
    /// Names accepted by `sort`, in table order.
    pub const NAMES: [&'static str; 9] = [
        "id", "name", "date", "time", "headcount", "address", "zone", "type", "cost",
    ];

    fn key(self, row: &entities::order::Model) -> &str {
        match self {
            Self::Id => "",
            Self::RequesterName => &row.requester_name,
            Self::Date => &row.event_date,
            Self::Time => &row.time_slot,
            Self::Headcount => &row.headcount,
            Self::Address => &row.address,
            Self::Zone => &row.zone,
            Self::EventType => &row.event_type,
            Self::Cost => &row.cost,
        }
    }

    /// Numbers compare as numbers; anything else compares as text.
    fn compare(self, a: &entities::order::Model, b: &entities::order::Model) -> Ordering {
        if self == Self::Id {
            return a.id.cmp(&b.id);
        }
        let (left, right) = (self.key(a), self.key(b));
        match (parse_number(left), parse_number(right)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => left.cmp(right),
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" | "requester" => Ok(Self::RequesterName),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "headcount" | "people" => Ok(Self::Headcount),
            "address" => Ok(Self::Address),
            "zone" => Ok(Self::Zone),
            "type" => Ok(Self::EventType),
            "cost" => Ok(Self::Cost),
            _ => Err(name.to_string()),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "ID",
            Self::RequesterName => "Requester",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Headcount => "Headcount",
            Self::Address => "Address",
            Self::Zone => "Zone",
            Self::EventType => "Event type",
            Self::Cost => "Cost",
        })
    }
}

/// Current ordering of the displayed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    /// Column sorted on
    pub column: SortColumn,
    /// Whether the order is reversed
    pub descending: bool,
}

/// Owns the store handle and the displayed row set.
pub struct Controller {
    db: DatabaseConnection,
    analytics: AnalyticsSettings,
    scorer: Box<dyn SentimentScorer>,
    rows: Vec<entities::order::Model>,
    sort: Option<SortState>,
}

impl Controller {
    /// Creates a controller with the configured sentiment scorer and an empty view.
    #[must_use]
    pub fn new(db: DatabaseConnection, analytics: AnalyticsSettings) -> Self {
        let scorer = analytics.sentiment_scorer.build();
        Self {
            db,
            analytics,
            scorer,
            rows: Vec::new(),
            sort: None,
        }
    }

    /// Replaces the sentiment scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl SentimentScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Rows currently on screen.
    #[must_use]
    pub fn rows(&self) -> &[entities::order::Model] {
        &self.rows
    }

    /// Current sort, if any.
    #[must_use]
    pub const fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Reloads the displayed rows from the store, keeping the current sort.
    pub async fn refresh(&mut self) -> Notice {
        match order::list_orders(&self.db).await {
            Ok(rows) => {
                self.rows = rows;
                self.apply_sort();
                Notice::Info(format!("{} order(s) loaded", self.rows.len()))
            }
            Err(err) => failure("Loading orders", &err),
        }
    }

    /// Sorts the view by `column`; sorting by the same column again reverses it.
    pub fn sort_by(&mut self, column: SortColumn) -> Notice {
        let descending = matches!(
            self.sort,
            Some(SortState { column: current, descending }) if current == column && !descending
        );
        self.sort = Some(SortState { column, descending });
        self.apply_sort();
        Notice::Info(format!(
            "Sorted by {column} ({})",
            if descending { "descending" } else { "ascending" }
        ))
    }

    fn apply_sort(&mut self) {
        if let Some(SortState { column, descending }) = self.sort {
            self.rows.sort_by(|a, b| {
                let ordering = column.compare(a, b);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
    }

    /// Looks up one order, e.g. to prefill the edit form.
    pub async fn find_order(&self, id: OrderId) -> Result<entities::order::Model, Notice> {
        match order::get_order(&self.db, id).await {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(Notice::Warning(format!("Order {id} does not exist"))),
            Err(err) => Err(failure("Loading the order", &err)),
        }
    }

    /// Adds an order. Fields are stored as typed.
    pub async fn add(&mut self, fields: &OrderFields) -> Notice {
        match order::add_order(&self.db, fields).await {
            Ok(created) => {
                self.reload_after(format!("Order {} added", created.order_id()))
                    .await
            }
            Err(err) => failure("Adding the order", &err),
        }
    }

    /// Overwrites the core fields of an order.
    pub async fn update(&mut self, id: OrderId, fields: &OrderFields) -> Notice {
        let result = order::update_order(&self.db, id, fields).await;
        self.mutation_notice(result, "Updating the order", format!("Order {id} updated"))
            .await
    }

    /// Deletes an order. The caller must have confirmed with the user.
    pub async fn delete(&mut self, id: OrderId) -> Notice {
        let result = order::delete_order(&self.db, id).await;
        self.mutation_notice(result, "Deleting the order", format!("Order {id} deleted"))
            .await
    }

    /// Sets or clears the comment of an order.
    pub async fn set_comment(&mut self, id: OrderId, comment: &str) -> Notice {
        let result = order::set_comment(&self.db, id, Some(comment)).await;
        self.mutation_notice(
            result,
            "Saving the comment",
            format!("Comment of order {id} saved"),
        )
        .await
    }

    /// Selector list of the assignment view.
    pub async fn assignments(&self) -> Result<Vec<AssignmentRow>, Notice> {
        assignment::list_assignments(&self.db)
            .await
            .map_err(|err| failure("Loading assignments", &err))
    }

    /// Assignment form of one order, with empty strings for unset values.
    pub async fn assignment(&self, id: OrderId) -> Result<AssignmentForm, Notice> {
        match assignment::get_assignment(&self.db, id).await {
            Ok(Some(form)) => Ok(form),
            Ok(None) => Err(Notice::Warning(format!("Order {id} does not exist"))),
            Err(err) => Err(failure("Loading the assignment", &err)),
        }
    }

    /// Saves collaborators and ingredient quantities; all or nothing.
    pub async fn save_assignment(
        &mut self,
        id: OrderId,
        collaborators: &str,
        quantities: &IngredientInput,
    ) -> Notice {
        let result = assignment::update_assignment(&self.db, id, collaborators, quantities).await;
        self.mutation_notice(
            result,
            "Saving the assignment",
            format!("Assignment of order {id} saved"),
        )
        .await
    }

    /// Refreshes the view after a successful change. A failed reload downgrades the
    /// confirmation to a warning, since the rows on screen are stale.
    async fn reload_after(&mut self, success: String) -> Notice {
        match self.refresh().await {
            Notice::Error(reason) => Notice::Warning(format!(
                "{success}, but the order list could not be reloaded ({reason})"
            )),
            _ => Notice::Info(success),
        }
    }

    async fn mutation_notice(
        &mut self,
        result: crate::errors::Result<MutationOutcome>,
        action: &str,
        success: String,
    ) -> Notice {
        match result {
            Ok(MutationOutcome::Applied { .. }) => self.reload_after(success).await,
            Ok(MutationOutcome::NotFound) => Notice::Warning(format!(
                "{action}: no order matched, it may have been deleted. Nothing changed."
            )),
            Err(err) => failure(action, &err),
        }
    }

    /// Events, headcount and cost per zone.
    pub async fn zone_statistics(&self) -> Result<ZoneReport, Notice> {
        stats::zone_statistics(&self.db)
            .await
            .map_err(|err| failure("Zone statistics", &err))
    }

    /// Monthly demand history and forecast.
    pub async fn forecast(&self) -> Result<DemandForecast, Notice> {
        demand::forecast_demand(&self.db, self.analytics.forecast_horizon)
            .await
            .map_err(|err| failure("Demand forecast", &err))
    }

    /// Headcount segments.
    pub async fn segments(&self) -> Result<SegmentReport, Notice> {
        segments::segment_customers(&self.db)
            .await
            .map_err(|err| failure("Segmentation", &err))
    }

    /// Sentiment labels of every commented order.
    pub async fn sentiments(&self) -> Result<Vec<CommentSentiment>, Notice> {
        sentiment::analyze_comments(
            &self.db,
            self.scorer.as_ref(),
            self.analytics.sentiment_threshold,
        )
        .await
        .map_err(|err| failure("Sentiment analysis", &err))
    }
}
