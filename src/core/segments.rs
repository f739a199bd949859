//! Customer segmentation by event size.
//!
//! Orders are bucketed with fixed headcount thresholds rather than a fitted model:
//!
//! | Segment | Headcount   |
//! |---------|-------------|
//! | Small   | 20 to 70    |
//! | Medium  | 71 to 149   |
//! | Large   | above 150   |
//!
//! Anything else (fewer than 20 guests, exactly 150, fractional counts between buckets, or
//! a headcount that is not a number) is left unsegmented and excluded from the report.

use crate::{
    core::{OrderId, order::list_orders, stats::parse_number},
    entities::order,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::fmt;
use tracing::debug;

/// Headcount bucket of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// 20 to 70 guests
    Small,
    /// 71 to 149 guests
    Medium,
    /// More than 150 guests
    Large,
}

impl Segment {
    /// Every segment, smallest first.
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Buckets a headcount, or None if it falls outside every bucket.
    #[must_use]
    pub fn classify(headcount: f64) -> Option<Self> {
        if (20.0..=70.0).contains(&headcount) {
            Some(Self::Small)
        } else if (71.0..=149.0).contains(&headcount) {
            Some(Self::Medium)
        } else if headcount > 150.0 {
            Some(Self::Large)
        } else {
            None
        }
    }

    /// Numeric cluster label, 0 for the smallest bucket.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        })
    }
}

/// One segmented order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedOrder {
    /// Order identifier
    pub id: OrderId,
    /// Requester name
    pub requester_name: String,
    /// Zone
    pub zone: String,
    /// Parsed headcount
    pub headcount: f64,
    /// Parsed cost, if readable
    pub cost: Option<f64>,
    /// Assigned bucket
    pub segment: Segment,
}

/// Averages for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    /// The bucket
    pub segment: Segment,
    /// Zone of the first order in the bucket
    pub representative_zone: String,
    /// Orders in the bucket
    pub orders: usize,
    /// Mean headcount
    pub mean_headcount: f64,
    /// Mean of the readable costs, None when no cost in the bucket parses
    pub mean_cost: Option<f64>,
}

/// Segmentation of the whole store.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    /// One summary per non-empty segment, smallest first
    pub summaries: Vec<SegmentSummary>,
    /// Every segmented order, in storage order
    pub orders: Vec<SegmentedOrder>,
    /// Orders left out of every bucket
    pub unsegmented: usize,
}

/// Loads every order and buckets it by headcount.
pub async fn segment_customers(db: &DatabaseConnection) -> Result<SegmentReport> {
    let orders = list_orders(db).await?;
    segment_orders(&orders)
}

/// Buckets `orders` and summarizes each bucket.
#[allow(clippy::cast_precision_loss)] // bucket sizes are far below 2^52
pub fn segment_orders(orders: &[order::Model]) -> Result<SegmentReport> {
    let segmented: Vec<SegmentedOrder> = orders
        .iter()
        .filter_map(|order| {
            let headcount = parse_number(&order.headcount)?;
            let segment = Segment::classify(headcount)?;
            Some(SegmentedOrder {
                id: order.order_id(),
                requester_name: order.requester_name.clone(),
                zone: order.zone.clone(),
                headcount,
                cost: parse_number(&order.cost),
                segment,
            })
        })
        .collect();

    if segmented.is_empty() {
        return Err(Error::Analytics {
            analysis: "Segmentation",
            message: "no order has a headcount inside any segment".to_string(),
        });
    }

    let summaries: Vec<SegmentSummary> = Segment::ALL
        .into_iter()
        .filter_map(|segment| {
            let members: Vec<&SegmentedOrder> =
                segmented.iter().filter(|o| o.segment == segment).collect();
            let first = members.first()?;
            let costs: Vec<f64> = members.iter().filter_map(|o| o.cost).collect();

            Some(SegmentSummary {
                segment,
                representative_zone: first.zone.clone(),
                orders: members.len(),
                mean_headcount: members.iter().map(|o| o.headcount).sum::<f64>()
                    / members.len() as f64,
                mean_cost: (!costs.is_empty())
                    .then(|| costs.iter().sum::<f64>() / costs.len() as f64),
            })
        })
        .collect();

    let unsegmented = orders.len() - segmented.len();
    debug!(
        segmented = segmented.len(),
        unsegmented,
        segments = summaries.len(),
        "Segmented orders"
    );

    Ok(SegmentReport {
        summaries,
        unsegmented,
        orders: segmented,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(Segment::classify(19.0), None);
        assert_eq!(Segment::classify(20.0), Some(Segment::Small));
        assert_eq!(Segment::classify(70.0), Some(Segment::Small));
        assert_eq!(Segment::classify(70.5), None);
        assert_eq!(Segment::classify(71.0), Some(Segment::Medium));
        assert_eq!(Segment::classify(149.0), Some(Segment::Medium));
        assert_eq!(Segment::classify(150.0), None);
        assert_eq!(Segment::classify(151.0), Some(Segment::Large));
    }

    #[tokio::test]
    async fn test_segment_customers_summaries() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_order(&db, "A", "2024-01-01", "Norte", "30", "3000").await?;
        create_custom_order(&db, "B", "2024-01-02", "Sur", "50", "5000").await?;
        create_custom_order(&db, "C", "2024-01-03", "Centro", "100", "9000").await?;
        create_custom_order(&db, "D", "2024-01-04", "Este", "200", "a convenir").await?;
        create_custom_order(&db, "E", "2024-01-05", "Oeste", "10", "100").await?;
        create_custom_order(&db, "F", "2024-01-06", "Oeste", "150", "100").await?;

        let report = segment_customers(&db).await?;
        assert_eq!(report.unsegmented, 2);
        assert_eq!(report.orders.len(), 4);
        assert_eq!(report.orders[0].requester_name, "A");
        assert_eq!(report.orders[3].segment, Segment::Large);

        assert_eq!(
            report.summaries,
            vec![
                SegmentSummary {
                    segment: Segment::Small,
                    representative_zone: "Norte".to_string(),
                    orders: 2,
                    mean_headcount: 40.0,
                    mean_cost: Some(4000.0),
                },
                SegmentSummary {
                    segment: Segment::Medium,
                    representative_zone: "Centro".to_string(),
                    orders: 1,
                    mean_headcount: 100.0,
                    mean_cost: Some(9000.0),
                },
                SegmentSummary {
                    segment: Segment::Large,
                    representative_zone: "Este".to_string(),
                    orders: 1,
                    mean_headcount: 200.0,
                    mean_cost: None,
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_no_segmentable_orders_is_analytics_error() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_order(&db, "A", "2024-01-01", "Norte", "muchos", "1").await?;

        let result = segment_customers(&db).await;
        assert!(matches!(result, Err(Error::Analytics { .. })));
        Ok(())
    }

    #[test]
    fn test_segment_index_matches_cluster_labels() {
        assert_eq!(Segment::Small.index(), 0);
        assert_eq!(Segment::Medium.index(), 1);
        assert_eq!(Segment::Large.index(), 2);
    }
}
