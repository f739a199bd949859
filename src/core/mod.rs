//! Core business logic - framework-agnostic record store, assignment view and analytics.

/// Resource assignment extension: collaborators and ingredient quantities
pub mod assignment;
/// Monthly demand series and forecasting
pub mod demand;
/// Record store: CRUD over the order table
pub mod order;
/// Headcount-based customer segmentation
pub mod segments;
/// Comment sentiment labelling
pub mod sentiment;
/// Per-zone descriptive statistics
pub mod stats;

pub use order::{OrderFields, OrderId};

/// Result of a mutation addressed by identifier.
///
/// A mutation that matched no row is a warning for the caller to surface, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The statement changed this many rows
    Applied {
        /// Affected row count
        rows: u64,
    },
    /// No row carries the requested identifier
    NotFound,
}

impl MutationOutcome {
    /// Classifies an affected-row count.
    #[must_use]
    pub const fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            Self::NotFound
        } else {
            Self::Applied { rows }
        }
    }

    /// Whether any row was changed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
