//! Plain-text rendering of orders and analysis results.

use super::controller::SortState;
use crate::{
    core::{
        OrderFields,
        assignment::{AssignmentRow, Ingredient, format_quantity},
        demand::DemandForecast,
        segments::SegmentReport,
        sentiment::CommentSentiment,
        stats::ZoneReport,
    },
    entities,
    errors::Result,
};
use std::fmt::Write;

/// Longest cell rendered before truncation.
const MAX_CELL_WIDTH: usize = 40;

fn cell(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        text.to_string()
    } else {
        let kept: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{kept}…")
    }
}

fn write_row<'a>(
    out: &mut String,
    widths: &[usize],
    values: impl Iterator<Item = &'a str>,
) -> Result<()> {
    let mut line = String::new();
    for (value, width) in values.zip(widths) {
        let padding = width.saturating_sub(value.chars().count());
        write!(line, "{value}{}  ", " ".repeat(padding))?;
    }
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

/// Writes an aligned table with a header separator.
fn write_table(out: &mut String, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    write_row(out, &widths, headers.iter().copied())?;
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(out, &widths, separator.iter().map(String::as_str))?;
    for row in rows {
        write_row(out, &widths, row.iter().map(String::as_str))?;
    }
    Ok(())
}

/// The main order table.
pub fn render_orders(
    rows: &[entities::order::Model],
    sort: Option<SortState>,
) -> Result<String> {
    let mut out = String::new();
    if rows.is_empty() {
        writeln!(out, "No orders yet. Use `add` to create one.")?;
        return Ok(out);
    }

    let mut headers = vec!["ID"];
    headers.extend(OrderFields::LABELS);
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.id.to_string()];
            cells.extend(row.fields().values().iter().map(|v| cell(v)));
            cells
        })
        .collect();
    write_table(&mut out, &headers, &table)?;

    if let Some(SortState { column, descending }) = sort {
        writeln!(
            out,
            "({} order(s), sorted by {column} {})",
            rows.len(),
            if descending { "desc" } else { "asc" }
        )?;
    } else {
        writeln!(out, "({} order(s))", rows.len())?;
    }
    Ok(out)
}

/// The assignment selector list.
pub fn render_assignments(rows: &[AssignmentRow]) -> Result<String> {
    let mut out = String::new();
    if rows.is_empty() {
        writeln!(out, "No orders to assign.")?;
        return Ok(out);
    }

    let mut headers = vec!["ID", "Requester", "Date", "Headcount", "Collaborators"];
    headers.extend(Ingredient::ALL.map(Ingredient::label));
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.id.to_string(),
                cell(&row.requester_name),
                row.event_date.clone(),
                row.headcount.clone(),
                cell(row.collaborators.as_deref().unwrap_or_default()),
            ];
            cells.extend(
                Ingredient::ALL.map(|i| row.quantity(i).map(format_quantity).unwrap_or_default()),
            );
            cells
        })
        .collect();
    write_table(&mut out, &headers, &table)?;
    Ok(out)
}

/// Zone statistics table.
pub fn render_zone_report(report: &ZoneReport) -> Result<String> {
    let mut out = String::new();
    let table: Vec<Vec<String>> = report
        .zones
        .iter()
        .map(|zone| {
            vec![
                cell(&zone.zone),
                zone.events.to_string(),
                format!("{}", zone.total_headcount),
                format!("{:.2}", zone.total_cost),
            ]
        })
        .collect();
    write_table(
        &mut out,
        &["Zone", "Events", "Total headcount", "Total cost"],
        &table,
    )?;
    if report.unparsed_values > 0 {
        writeln!(
            out,
            "{} headcount/cost value(s) were not numbers and were left out of the sums.",
            report.unparsed_values
        )?;
    }
    Ok(out)
}

/// Demand history followed by the forecast.
pub fn render_forecast(forecast: &DemandForecast) -> Result<String> {
    let mut out = String::new();
    let mut table: Vec<Vec<String>> = forecast
        .history
        .iter()
        .map(|m| {
            vec![
                m.month.format("%Y-%m").to_string(),
                format!("{}", m.headcount),
                "history".to_string(),
            ]
        })
        .collect();
    table.extend(forecast.forecast.iter().map(|m| {
        vec![
            m.month.format("%Y-%m").to_string(),
            format!("{:.1}", m.headcount),
            "forecast".to_string(),
        ]
    }));
    write_table(&mut out, &["Month", "Headcount", "Kind"], &table)?;
    writeln!(
        out,
        "Model: ARIMA(1,1,1), phi = {:.3}, theta = {:.3}",
        forecast.phi, forecast.theta
    )?;
    Ok(out)
}

/// Segment summaries followed by the per-order assignment.
pub fn render_segments(report: &SegmentReport) -> Result<String> {
    let mut out = String::new();
    let summaries: Vec<Vec<String>> = report
        .summaries
        .iter()
        .map(|s| {
            vec![
                format!("{} ({})", s.segment, s.segment.index()),
                cell(&s.representative_zone),
                s.orders.to_string(),
                format!("{:.1}", s.mean_headcount),
                s.mean_cost.map(|c| format!("{c:.2}")).unwrap_or_default(),
            ]
        })
        .collect();
    write_table(
        &mut out,
        &["Segment", "Zone", "Orders", "Mean headcount", "Mean cost"],
        &summaries,
    )?;
    writeln!(out)?;

    let orders: Vec<Vec<String>> = report
        .orders
        .iter()
        .map(|o| {
            vec![
                o.id.to_string(),
                cell(&o.requester_name),
                cell(&o.zone),
                format!("{}", o.headcount),
                o.cost.map(|c| format!("{c:.2}")).unwrap_or_default(),
                o.segment.to_string(),
            ]
        })
        .collect();
    write_table(
        &mut out,
        &["ID", "Requester", "Zone", "Headcount", "Cost", "Segment"],
        &orders,
    )?;
    if report.unsegmented > 0 {
        writeln!(
            out,
            "{} order(s) fall outside every segment.",
            report.unsegmented
        )?;
    }
    Ok(out)
}

/// Sentiment table.
pub fn render_sentiments(results: &[CommentSentiment]) -> Result<String> {
    let mut out = String::new();
    let table: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                cell(&r.requester_name),
                cell(&r.comment),
                r.label.to_string(),
                format!("{:+.3}", r.compound),
            ]
        })
        .collect();
    write_table(
        &mut out,
        &["ID", "Requester", "Comment", "Sentiment", "Score"],
        &table,
    )?;
    Ok(out)
}
