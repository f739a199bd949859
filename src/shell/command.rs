//! Parsing of shell input lines into commands.

use super::controller::SortColumn;
use crate::core::OrderId;
use thiserror::Error;

/// One user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reload and show all orders
    List,
    /// Sort the order view
    Sort(SortColumn),
    /// Open the new-order form
    Add,
    /// Open the edit form of an order
    Edit(OrderId),
    /// Delete an order after confirmation
    Delete(OrderId),
    /// Write or clear the comment of an order
    Comment(OrderId),
    /// Show the assignment selector list
    Assignments,
    /// Open the assignment form of an order
    Assign(OrderId),
    /// Zone statistics
    Stats,
    /// Demand history and forecast
    Forecast,
    /// Headcount segmentation
    Segments,
    /// Comment sentiment
    Sentiment,
    /// Command summary
    Help,
    /// Leave the shell
    Quit,
}

/// Why a line could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Nothing but whitespace was entered
    #[error("empty input")]
    Empty,
    /// The first word is not a command
    #[error("Unknown command {0:?}. Type `help` for the list of commands.")]
    Unknown(String),
    /// The command needs an order id
    #[error("`{0}` needs an order id, e.g. `{0} 3`")]
    MissingId(&'static str),
    /// The argument is not an order id
    #[error("{0:?} is not an order id")]
    BadId(String),
    /// `sort` without a column
    #[error("`sort` needs a column: {columns}", columns = SortColumn::NAMES.join(", "))]
    MissingColumn,
    /// `sort` with an unknown column
    #[error("Unknown column {0:?}. Columns: {columns}", columns = SortColumn::NAMES.join(", "))]
    UnknownColumn(String),
}

fn order_id(command: &'static str, argument: Option<&str>) -> Result<OrderId, CommandError> {
    let raw = argument.ok_or(CommandError::MissingId(command))?;
    raw.parse::<i64>()
        .map(OrderId::new)
        .map_err(|_| CommandError::BadId(raw.to_string()))
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Err(CommandError::Empty);
    };
    let argument = words.next();

    match name.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(Command::List),
        "sort" => {
            let column = argument.ok_or(CommandError::MissingColumn)?;
            column
                .parse()
                .map(Command::Sort)
                .map_err(CommandError::UnknownColumn)
        }
        "add" | "new" => Ok(Command::Add),
        "edit" => order_id("edit", argument).map(Command::Edit),
        "delete" | "rm" => order_id("delete", argument).map(Command::Delete),
        "comment" => order_id("comment", argument).map(Command::Comment),
        "assign" => match argument {
            None => Ok(Command::Assignments),
            Some(_) => order_id("assign", argument).map(Command::Assign),
        },
        "stats" => Ok(Command::Stats),
        "forecast" => Ok(Command::Forecast),
        "segments" | "clusters" => Ok(Command::Segments),
        "sentiment" => Ok(Command::Sentiment),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(name.to_string())),
    }
}

/// Text printed by `help`.
pub const HELP: &str = "\
Orders
  list                 reload and show all orders
  sort <column>        sort the view (repeat to reverse)
  add                  add an order
  edit <id>            edit the core fields of an order
  delete <id>          delete an order (asks for confirmation)
  comment <id>         write or clear the customer comment
Assignments
  assign               list collaborators and ingredients per order
  assign <id>          edit collaborators and ingredient quantities
Analysis
  stats                events, headcount and cost per zone
  forecast             monthly demand and forecast
  segments             customers grouped by event size
  sentiment            sentiment of customer comments
Other
  help                 this text
  quit                 leave";
