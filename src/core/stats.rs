//! Per-zone descriptive statistics.
//!
//! Counts events and sums headcount and cost for every zone. Because the store keeps
//! headcount and cost as unvalidated text, they are parsed leniently here: a value that is
//! not a number contributes nothing to its sum and is counted in
//! [`ZoneReport::unparsed_values`] instead of failing the whole report.

use crate::{
    core::order::list_orders,
    entities::order,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use tracing::warn;

/// Aggregates for one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneStats {
    /// Zone name as stored
    pub zone: String,
    /// Number of orders in the zone
    pub events: usize,
    /// Sum of parseable headcounts
    pub total_headcount: f64,
    /// Sum of parseable costs
    pub total_cost: f64,
}

/// Zone statistics for the whole store.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    /// One entry per zone, busiest first
    pub zones: Vec<ZoneStats>,
    /// Headcount or cost values that could not be read as numbers
    pub unparsed_values: usize,
}

/// Reads a numeric-looking text field, ignoring surrounding whitespace.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Loads every order and summarizes it per zone.
pub async fn zone_statistics(db: &DatabaseConnection) -> Result<ZoneReport> {
    let orders = list_orders(db).await?;
    summarize_zones(&orders)
}

/// Groups `orders` by zone, ordered by event count (descending) then zone name.
pub fn summarize_zones(orders: &[order::Model]) -> Result<ZoneReport> {
    if orders.is_empty() {
        return Err(Error::Analytics {
            analysis: "Zone statistics",
            message: "there are no orders to summarize".to_string(),
        });
    }

    let mut by_zone: BTreeMap<&str, ZoneStats> = BTreeMap::new();
    let mut unparsed_values = 0;

    for order in orders {
        let entry = by_zone
            .entry(order.zone.as_str())
            .or_insert_with(|| ZoneStats {
                zone: order.zone.clone(),
                events: 0,
                total_headcount: 0.0,
                total_cost: 0.0,
            });
        entry.events += 1;

        match parse_number(&order.headcount) {
            Some(headcount) => entry.total_headcount += headcount,
            None => {
                warn!(id = order.id, headcount = %order.headcount, "Headcount is not a number");
                unparsed_values += 1;
            }
        }
        match parse_number(&order.cost) {
            Some(cost) => entry.total_cost += cost,
            None => {
                warn!(id = order.id, cost = %order.cost, "Cost is not a number");
                unparsed_values += 1;
            }
        }
    }

    let mut zones: Vec<ZoneStats> = by_zone.into_values().collect();
    zones.sort_by(|a, b| b.events.cmp(&a.events).then_with(|| a.zone.cmp(&b.zone)));

    Ok(ZoneReport {
        zones,
        unparsed_values,
    })
}
