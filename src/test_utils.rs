//! Shared test utilities for the order manager.
//!
//! This module provides helpers for setting up test databases and creating test orders
//! with sensible defaults.

use crate::{
    config::{DatabaseSettings, database},
    core::{
        OrderFields,
        assignment::{Ingredient, IngredientInput},
        order,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with the order table initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an in-memory database whose pool holds exactly one connection and gives up
/// after one second. A connection that is never returned makes the next call fail.
pub async fn setup_single_connection_db() -> Result<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_secs: 1,
    };
    database::init_db(&settings).await
}

/// The order from the reference scenario: Ana, 50 guests in Norte.
#[must_use]
pub fn ana_fields() -> OrderFields {
    OrderFields {
        requester_name: "Ana".to_string(),
        event_date: "2024-01-10".to_string(),
        time_slot: "18:00".to_string(),
        headcount: "50".to_string(),
        address: "Calle 1".to_string(),
        zone: "Norte".to_string(),
        event_type: "Cumpleaños".to_string(),
        cost: "5000".to_string(),
    }
}

/// Creates a test order with sensible defaults.
///
/// # Defaults
/// * everything from [`ana_fields`] except the requester name
pub async fn create_test_order(
    db: &DatabaseConnection,
    requester_name: &str,
) -> Result<entities::order::Model> {
    let fields = OrderFields {
        requester_name: requester_name.to_string(),
        ..ana_fields()
    };
    order::add_order(db, &fields).await
}

/// Creates a test order with a custom date, zone, headcount and cost.
/// Use this when a test aggregates over several orders.
pub async fn create_custom_order(
    db: &DatabaseConnection,
    requester_name: &str,
    event_date: &str,
    zone: &str,
    headcount: &str,
    cost: &str,
) -> Result<entities::order::Model> {
    let fields = OrderFields {
        requester_name: requester_name.to_string(),
        event_date: event_date.to_string(),
        zone: zone.to_string(),
        headcount: headcount.to_string(),
        cost: cost.to_string(),
        ..ana_fields()
    };
    order::add_order(db, &fields).await
}

/// The same raw quantity for all eight ingredients.
#[must_use]
pub fn uniform_quantities(raw: &str) -> IngredientInput {
    let mut input = IngredientInput::default();
    for ingredient in Ingredient::ALL {
        input.set(ingredient, raw);
    }
    input
}
