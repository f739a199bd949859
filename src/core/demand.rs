//! Monthly demand series and forecasting.
//!
//! Demand is the total headcount served per calendar month. The series is contiguous:
//! months without orders appear with zero demand. The forecast fits an ARIMA(1,1,1)
//! model without a trend term to that series:
//!
//! ```text
//! d[t] = y[t] - y[t-1]
//! d[t] = phi * d[t-1] + e[t] + theta * e[t-1]
//! ```
//!
//! `phi` and `theta` minimize the conditional sum of squared residuals (the first residual
//! is taken as zero), found by a coarse grid over the stationary and invertible region
//! followed by a finer grid around the best point. The model is then rolled forward
//! month by month with future shocks at zero. Forecast demand is clamped at zero.

use crate::{
    core::{order::list_orders, stats::parse_number},
    entities::order,
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use tracing::debug;

const ANALYSIS: &str = "Demand forecast";

/// Fewest months of history the forecast accepts.
pub const MIN_HISTORY_MONTHS: usize = 4;

/// Accepted spellings of an event date.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Largest coefficient magnitude searched, keeping the fit stationary and invertible.
const MAX_COEFFICIENT: f64 = 0.99;
/// Grid spacing of the coarse and the refining search.
const COARSE_STEP: f64 = 0.01;
const FINE_STEP: f64 = 0.001;

/// Demand for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyDemand {
    /// First day of the month
    pub month: NaiveDate,
    /// Total headcount
    pub headcount: f64,
}

/// Historical series plus its projection.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandForecast {
    /// Observed monthly demand, contiguous
    pub history: Vec<MonthlyDemand>,
    /// Projected monthly demand following the last observed month
    pub forecast: Vec<MonthlyDemand>,
    /// Fitted autoregressive coefficient on the differenced series
    pub phi: f64,
    /// Fitted moving-average coefficient on the differenced series
    pub theta: f64,
}

/// Parses an event date in any of the accepted formats. A trailing time part is ignored.
#[must_use]
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    #[allow(clippy::expect_used)]
    date.with_day(1).expect("First day of a month is always valid")
}

fn next_month(month: NaiveDate) -> Result<NaiveDate> {
    month
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::Analytics {
            analysis: ANALYSIS,
            message: format!("no month follows {month}"),
        })
}

/// Loads every order and builds the contiguous monthly demand series.
pub async fn monthly_demand(db: &DatabaseConnection) -> Result<Vec<MonthlyDemand>> {
    let orders = list_orders(db).await?;
    build_monthly_series(&orders)
}

/// Sums headcount per month from the first to the last month with orders.
///
/// An unreadable date aborts the analysis; an unreadable headcount counts as zero.
pub fn build_monthly_series(orders: &[order::Model]) -> Result<Vec<MonthlyDemand>> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for order in orders {
        let date = parse_event_date(&order.event_date).ok_or_else(|| Error::Analytics {
            analysis: ANALYSIS,
            message: format!(
                "order {} has an unreadable date {:?}",
                order.id, order.event_date
            ),
        })?;
        let headcount = parse_number(&order.headcount).unwrap_or(0.0);
        *totals.entry(month_start(date)).or_insert(0.0) += headcount;
    }

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return Err(Error::Analytics {
            analysis: ANALYSIS,
            message: "there are no orders to analyze".to_string(),
        });
    };

    let mut series = Vec::new();
    let mut month = first;
    while month <= last {
        series.push(MonthlyDemand {
            month,
            headcount: totals.get(&month).copied().unwrap_or(0.0),
        });
        month = next_month(month)?;
    }
    Ok(series)
}

/// Residuals of `d[t] = phi * d[t-1] + e[t] + theta * e[t-1]`, conditioned on the first
/// difference. Returns the sum of squares and the last residual.
fn conditional_residuals(diffs: &[f64], phi: f64, theta: f64) -> (f64, f64) {
    let (mut sum, mut previous) = (0.0, 0.0);
    for pair in diffs.windows(2) {
        let residual = pair[1] - phi * pair[0] - theta * previous;
        sum += residual * residual;
        previous = residual;
    }
    (sum, previous)
}

/// Evenly spaced points from `from` to `to` inclusive, clipped to the searched region.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // small positive counts
fn grid(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> + Clone {
    let from = from.max(-MAX_COEFFICIENT);
    let to = to.min(MAX_COEFFICIENT);
    let points = ((to - from) / step).round().max(0.0) as usize;
    (0..=points).map(move |i| {
        #[allow(clippy::cast_precision_loss)]
        let offset = i as f64 * step;
        (from + offset).min(to)
    })
}

/// Lowest-error `(phi, theta)` on the grid, starting from `best`. Ties keep `best`.
fn search(
    diffs: &[f64],
    best: (f64, f64),
    phis: impl Iterator<Item = f64>,
    thetas: impl Iterator<Item = f64> + Clone,
) -> (f64, f64) {
    let (mut best_phi, mut best_theta) = best;
    let mut best_sum = conditional_residuals(diffs, best_phi, best_theta).0;
    for phi in phis {
        for theta in thetas.clone() {
            let sum = conditional_residuals(diffs, phi, theta).0;
            if sum < best_sum {
                (best_phi, best_theta, best_sum) = (phi, theta, sum);
            }
        }
    }
    (best_phi, best_theta)
}

/// Fits `phi` and `theta` to the differenced series.
///
/// The search starts from the white-noise model, so a series with nothing to explain
/// (such as a flat one) keeps both coefficients at zero.
fn fit_differenced_arma11(diffs: &[f64]) -> (f64, f64) {
    let coarse = grid(-MAX_COEFFICIENT, MAX_COEFFICIENT, COARSE_STEP);
    let (phi, theta) = search(diffs, (0.0, 0.0), coarse.clone(), coarse);
    search(
        diffs,
        (phi, theta),
        grid(phi - COARSE_STEP, phi + COARSE_STEP, FINE_STEP),
        grid(theta - COARSE_STEP, theta + COARSE_STEP, FINE_STEP),
    )
}

/// Projects `horizon` months of demand beyond the end of `history`.
pub fn forecast_series(history: Vec<MonthlyDemand>, horizon: usize) -> Result<DemandForecast> {
    if history.len() < MIN_HISTORY_MONTHS {
        return Err(Error::Analytics {
            analysis: ANALYSIS,
            message: format!(
                "insufficient data: {} month(s) of history, at least {MIN_HISTORY_MONTHS} needed",
                history.len()
            ),
        });
    }

    let diffs: Vec<f64> = history
        .windows(2)
        .map(|w| w[1].headcount - w[0].headcount)
        .collect();
    let (phi, theta) = fit_differenced_arma11(&diffs);
    let (sum_of_squares, mut last_residual) = conditional_residuals(&diffs, phi, theta);
    debug!(phi, theta, sum_of_squares, months = history.len(), "Fitted demand model");

    let n = history.len();
    let mut level = history[n - 1].headcount;
    let mut last_diff = diffs[diffs.len() - 1];
    let mut month = history[n - 1].month;

    let mut forecast = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let diff = phi * last_diff + theta * last_residual;
        last_residual = 0.0;
        level += diff;
        last_diff = diff;
        month = next_month(month)?;
        forecast.push(MonthlyDemand {
            month,
            headcount: level.max(0.0),
        });
    }

    Ok(DemandForecast {
        history,
        forecast,
        phi,
        theta,
    })
}

/// Builds the monthly series from the store and projects `horizon` months ahead.
pub async fn forecast_demand(db: &DatabaseConnection, horizon: usize) -> Result<DemandForecast> {
    let history = monthly_demand(db).await?;
    forecast_series(history, horizon)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn series(values: &[f64]) -> Vec<MonthlyDemand> {
        values
            .iter()
            .enumerate()
            .map(|(i, &headcount)| MonthlyDemand {
                month: ymd(2024, u32::try_from(i).unwrap() + 1, 1),
                headcount,
            })
            .collect()
    }

    fn projected(forecast: &DemandForecast) -> Vec<f64> {
        forecast.forecast.iter().map(|m| m.headcount).collect()
    }

    #[test]
    fn test_parse_event_date_formats() {
        assert_eq!(parse_event_date("2024-01-10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_event_date("2024/01/10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_event_date("10/01/2024"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_event_date("10-01-2024"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_event_date(" 2024-01-10 00:00:00"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_event_date("mañana"), None);
        assert_eq!(parse_event_date(""), None);
    }

    #[tokio::test]
    async fn test_monthly_demand_fills_gaps() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_order(&db, "A", "2024-01-10", "Norte", "50", "1").await?;
        create_custom_order(&db, "B", "2024-01-25", "Sur", "30", "1").await?;
        create_custom_order(&db, "C", "05/03/2024", "Norte", "20", "1").await?;

        let demand = monthly_demand(&db).await?;
        assert_eq!(
            demand,
            vec![
                MonthlyDemand {
                    month: ymd(2024, 1, 1),
                    headcount: 80.0
                },
                MonthlyDemand {
                    month: ymd(2024, 2, 1),
                    headcount: 0.0
                },
                MonthlyDemand {
                    month: ymd(2024, 3, 1),
                    headcount: 20.0
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_date_is_analytics_error() -> Result<()> {
        let db = setup_test_db().await?;
        create_custom_order(&db, "A", "el sábado", "Norte", "50", "1").await?;

        let result = monthly_demand(&db).await;
        assert!(matches!(result, Err(Error::Analytics { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_store_is_analytics_error() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            forecast_demand(&db, 12).await,
            Err(Error::Analytics { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_insufficient_history_is_rejected() {
        let result = forecast_series(series(&[10.0, 20.0, 30.0]), 12);
        assert!(matches!(result, Err(Error::Analytics { .. })));
    }

    #[test]
    fn test_linear_growth_continues() {
        let forecast = forecast_series(series(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3).unwrap();
        let values = projected(&forecast);
        assert!(forecast.phi > 0.9);
        assert!((values[0] - 60.0).abs() < 0.5, "{values:?}");
        assert!(values[0] < values[1] && values[1] < values[2]);
        assert_eq!(forecast.forecast[0].month, ymd(2024, 6, 1));
        assert_eq!(forecast.forecast[2].month, ymd(2024, 8, 1));
    }

    #[test]
    fn test_recovers_decaying_differences() {
        // Differences 16, 8, 4, 2, 1 halve every month
        let forecast =
            forecast_series(series(&[100.0, 116.0, 124.0, 128.0, 130.0, 131.0]), 2).unwrap();
        assert!((forecast.phi - 0.5).abs() < 0.01, "phi = {}", forecast.phi);

        let values = projected(&forecast);
        assert!((values[0] - 131.5).abs() < 0.05, "{values:?}");
        assert!((values[1] - 131.75).abs() < 0.05, "{values:?}");
    }

    #[test]
    fn test_flat_series_stays_flat() {
        let forecast = forecast_series(series(&[40.0; 6]), 4).unwrap();
        assert_eq!(forecast.phi, 0.0);
        assert_eq!(forecast.theta, 0.0);
        assert_eq!(projected(&forecast), vec![40.0; 4]);
    }

    #[test]
    fn test_forecast_is_clamped_at_zero() {
        let forecast = forecast_series(series(&[40.0, 30.0, 20.0, 10.0]), 3).unwrap();
        let values = projected(&forecast);
        assert!(values[0] < 1.0, "{values:?}");
        assert_eq!(values[1..], [0.0, 0.0]);
    }

    #[test]
    fn test_alternating_differences_fit_negative_phi() {
        let forecast =
            forecast_series(series(&[10.0, 20.0, 10.0, 20.0, 10.0, 20.0]), 2).unwrap();
        assert!(forecast.phi < 0.0);
        assert!(forecast.phi >= -MAX_COEFFICIENT);
        assert!(forecast.theta.abs() <= MAX_COEFFICIENT);
        assert_eq!(forecast.forecast.len(), 2);
    }

    #[test]
    fn test_grid_stays_inside_the_searched_region() {
        let points: Vec<f64> = grid(0.985, 1.2, FINE_STEP).collect();
        assert_eq!(points.first(), Some(&0.985));
        assert_eq!(points.last(), Some(&MAX_COEFFICIENT));
        assert!(grid(-2.0, 2.0, COARSE_STEP).all(|p| p.abs() <= MAX_COEFFICIENT));
    }

    #[test]
    fn test_forecast_crosses_year_boundary() {
        let history = vec![
            MonthlyDemand {
                month: ymd(2024, 9, 1),
                headcount: 10.0,
            },
            MonthlyDemand {
                month: ymd(2024, 10, 1),
                headcount: 10.0,
            },
            MonthlyDemand {
                month: ymd(2024, 11, 1),
                headcount: 10.0,
            },
            MonthlyDemand {
                month: ymd(2024, 12, 1),
                headcount: 10.0,
            },
        ];
        let forecast = forecast_series(history, 2).unwrap();
        assert_eq!(forecast.forecast[0].month, ymd(2025, 1, 1));
        assert_eq!(forecast.forecast[1].month, ymd(2025, 2, 1));
    }

    #[test]
    fn test_zero_horizon_has_empty_forecast() {
        let forecast = forecast_series(series(&[1.0, 2.0, 3.0, 4.0]), 0).unwrap();
        assert!(forecast.forecast.is_empty());
        assert_eq!(forecast.history.len(), 4);
    }
}
