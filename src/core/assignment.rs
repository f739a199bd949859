//! Resource assignment extension - collaborators and ingredient quantities per order.
//!
//! This is a second access pattern over the `taquizas` table, keyed by the same
//! [`OrderId`] as the record store: a bulk projection for the selector list, plus a
//! single-row form that can be read and written independently of the core fields.
//!
//! Unlike the core fields, ingredient quantities are validated. All eight must parse as
//! non-negative decimals before anything is written; one bad value rejects the whole call.

use super::{MutationOutcome, OrderId, order::log_outcome};
use crate::{
    entities::{Order, order},
    errors::{Error, Result},
};
use sea_orm::{FromQueryResult, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use std::fmt;

const UPDATE_ASSIGNMENT: &str = "Update assignment";

/// Ingredients planned per event, in their canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ingredient {
    /// Corn tortilla
    CornTortilla,
    /// Cheese
    Cheese,
    /// Flour tortilla
    FlourTortilla,
    /// Beef
    Beef,
    /// Chorizo
    Chorizo,
    /// Pork
    Pork,
    /// Onion
    Onion,
    /// Lime
    Lime,
}

impl Ingredient {
    /// Every ingredient, in column order.
    pub const ALL: [Self; 8] = [
        Self::CornTortilla,
        Self::Cheese,
        Self::FlourTortilla,
        Self::Beef,
        Self::Chorizo,
        Self::Pork,
        Self::Onion,
        Self::Lime,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Column holding this ingredient's quantity.
    #[must_use]
    pub const fn column(self) -> order::Column {
        match self {
            Self::CornTortilla => order::Column::KgCornTortilla,
            Self::Cheese => order::Column::KgCheese,
            Self::FlourTortilla => order::Column::KgFlourTortilla,
            Self::Beef => order::Column::KgBeef,
            Self::Chorizo => order::Column::KgChorizo,
            Self::Pork => order::Column::KgPork,
            Self::Onion => order::Column::KgOnion,
            Self::Lime => order::Column::KgLime,
        }
    }

    /// Field name used in validation errors.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::CornTortilla => "kg_corn_tortilla",
            Self::Cheese => "kg_cheese",
            Self::FlourTortilla => "kg_flour_tortilla",
            Self::Beef => "kg_beef",
            Self::Chorizo => "kg_chorizo",
            Self::Pork => "kg_pork",
            Self::Onion => "kg_onion",
            Self::Lime => "kg_lime",
        }
    }

    /// Human-readable label for forms and table headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CornTortilla => "Kg corn tortilla",
            Self::Cheese => "Kg cheese",
            Self::FlourTortilla => "Kg flour tortilla",
            Self::Beef => "Kg beef",
            Self::Chorizo => "Kg chorizo",
            Self::Pork => "Kg pork",
            Self::Onion => "Kg onion",
            Self::Lime => "Kg lime",
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw ingredient quantities as typed into the assignment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientInput {
    values: [String; 8],
}

impl IngredientInput {
    /// Builds the input from values in [`Ingredient::ALL`] order.
    #[must_use]
    pub const fn new(values: [String; 8]) -> Self {
        Self { values }
    }

    /// Raw text for one ingredient.
    #[must_use]
    pub fn get(&self, ingredient: Ingredient) -> &str {
        &self.values[ingredient.index()]
    }

    /// Replaces the raw text for one ingredient.
    pub fn set(&mut self, ingredient: Ingredient, value: impl Into<String>) {
        self.values[ingredient.index()] = value.into();
    }
}

/// Projection of the assignment columns for one order.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct AssignmentRow {
    /// Row identifier
    pub id: i64,
    /// Requester name
    pub requester_name: String,
    /// Event date
    pub event_date: String,
    /// Headcount as stored
    pub headcount: String,
    /// Assigned collaborators
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

impl AssignmentRow {
    /// Typed identifier of the order this row belongs to.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        OrderId::new(self.id)
    }

    /// Stored quantity for one ingredient, if set.
    #[must_use]
    pub const fn quantity(&self, ingredient: Ingredient) -> Option<f64> {
        match ingredient {
            Ingredient::CornTortilla => self.kg_corn_tortilla,
            Ingredient::Cheese => self.kg_cheese,
            Ingredient::FlourTortilla => self.kg_flour_tortilla,
            Ingredient::Beef => self.kg_beef,
            Ingredient::Chorizo => self.kg_chorizo,
            Ingredient::Pork => self.kg_pork,
            Ingredient::Onion => self.kg_onion,
            Ingredient::Lime => self.kg_lime,
        }
    }

    /// The editable form for this row, with absent values rendered as empty strings.
    #[must_use]
    pub fn to_form(&self) -> AssignmentForm {
        let mut quantities = IngredientInput::default();
        for ingredient in Ingredient::ALL {
            if let Some(kg) = self.quantity(ingredient) {
                quantities.set(ingredient, format_quantity(kg));
            }
        }
        AssignmentForm {
            collaborators: self.collaborators.clone().unwrap_or_default(),
            quantities,
        }
    }
}

/// Assignment fields of one order as form text. Never contains absent markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentForm {
    /// Collaborators, `""` when unset
    pub collaborators: String,
    /// Quantities, `""` for each unset ingredient
    pub quantities: IngredientInput,
}

const ASSIGNMENT_COLUMNS: [order::Column; 13] = [
    order::Column::Id,
    order::Column::RequesterName,
    order::Column::EventDate,
    order::Column::Headcount,
    order::Column::Collaborators,
    order::Column::KgCornTortilla,
    order::Column::KgCheese,
    order::Column::KgFlourTortilla,
    order::Column::KgBeef,
    order::Column::KgChorizo,
    order::Column::KgPork,
    order::Column::KgOnion,
    order::Column::KgLime,
];

/// Renders a stored quantity without a trailing `.0` for whole kilograms.
#[must_use]
pub fn format_quantity(kg: f64) -> String {
    format!("{kg}")
}

/// Parses one raw quantity, rejecting anything that is not a finite, non-negative decimal.
pub fn parse_quantity(ingredient: Ingredient, raw: &str) -> Result<f64> {
    let invalid = || Error::Validation {
        operation: UPDATE_ASSIGNMENT,
        field: ingredient.field_name(),
        value: raw.to_string(),
    };

    let kg: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !kg.is_finite() || kg < 0.0 {
        return Err(invalid());
    }
    Ok(kg)
}

/// Retrieves the assignment projection of every order, in storage order.
pub async fn list_assignments(db: &DatabaseConnection) -> Result<Vec<AssignmentRow>> {
    Order::find()
        .select_only()
        .columns(ASSIGNMENT_COLUMNS)
        .order_by_asc(order::Column::Id)
        .into_model::<AssignmentRow>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reads the assignment form of one order, or None if the identifier does not exist.
pub async fn get_assignment(
    db: &DatabaseConnection,
    id: OrderId,
) -> Result<Option<AssignmentForm>> {
    let row = Order::find_by_id(id.get())
        .select_only()
        .columns(ASSIGNMENT_COLUMNS)
        .into_model::<AssignmentRow>()
        .one(db)
        .await?;

    Ok(row.as_ref().map(AssignmentRow::to_form))
}

/// Overwrites the collaborators and all eight ingredient quantities of one order.
///
/// Every quantity is parsed before the database is touched. If any of them is not a
/// non-negative decimal the call fails with [`Error::Validation`] and no column changes.
/// Blank collaborator text is stored as unset.
pub async fn update_assignment(
    db: &DatabaseConnection,
    id: OrderId,
    collaborators: &str,
    quantities: &IngredientInput,
) -> Result<MutationOutcome> {
    let mut parsed = [0.0_f64; 8];
    for (slot, ingredient) in parsed.iter_mut().zip(Ingredient::ALL) {
        *slot = parse_quantity(ingredient, quantities.get(ingredient))?;
    }

    let collaborators = Some(collaborators.trim())
        .filter(|text| !text.is_empty())
        .map(ToString::to_string);

    let mut update =
        Order::update_many().col_expr(order::Column::Collaborators, Expr::value(collaborators));
    for (ingredient, kg) in Ingredient::ALL.into_iter().zip(parsed) {
        update = update.col_expr(ingredient.column(), Expr::value(kg));
    }

    let result = update
        .filter(order::Column::Id.eq(id.get()))
        .exec(db)
        .await?;

    let outcome = MutationOutcome::from_rows(result.rows_affected);
    log_outcome("update assignment", id, outcome);
    Ok(outcome)
}
