//! Order entity - One catering event ("taquiza") request.
//!
//! The eight core fields are stored as text exactly as they were typed, including the
//! numeric-looking `headcount` and `cost`. Assignment fields (collaborators and ingredient
//! quantities) and the customer comment are nullable and have their own lifecycle.
//!
//! `id` is declared as an auto-incrementing integer primary key, which SQLite turns into
//! an alias of the native rowid that is never handed out twice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "taquizas")]
pub struct Model {
    /// Row identifier assigned by the store
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the person requesting the event
    pub requester_name: String,
    /// Event date as typed (e.g. `"2024-01-10"`)
    pub event_date: String,
    /// Time slot as typed (e.g. `"18:00"`)
    pub time_slot: String,
    /// Expected number of guests, unvalidated text
    pub headcount: String,
    /// Delivery address
    pub address: String,
    /// Delivery zone used for grouping (e.g. `"Norte"`)
    pub zone: String,
    /// Kind of event (e.g. `"Cumpleaños"`)
    pub event_type: String,
    /// Quoted cost, unvalidated text
    pub cost: String,
    /// Optional free-text customer comment
    pub comment: Option<String>,
    /// Collaborators assigned to the event
    pub collaborators: Option<String>,
    /// Corn tortilla, kg
    pub kg_corn_tortilla: Option<f64>,
    /// Cheese, kg
    pub kg_cheese: Option<f64>,
    /// Flour tortilla, kg
    pub kg_flour_tortilla: Option<f64>,
    /// Beef, kg
    pub kg_beef: Option<f64>,
    /// Chorizo, kg
    pub kg_chorizo: Option<f64>,
    /// Pork, kg
    pub kg_pork: Option<f64>,
    /// Onion, kg
    pub kg_onion: Option<f64>,
    /// Lime, kg
    pub kg_lime: Option<f64>,
}

/// Orders have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
