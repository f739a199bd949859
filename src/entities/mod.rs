//! Entity module - Contains the SeaORM entity definition for the order table.
//! The whole application works on this single table; the assignment view is a
//! projection over the same rows rather than a separate entity.

pub mod order;

pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
