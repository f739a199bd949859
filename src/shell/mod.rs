//! Interactive console front end.
//!
//! [`run`] reads one command per line, hands it to the [`Controller`] and prints the
//! resulting table or [`Notice`]. Failures are printed and the loop keeps going; only
//! `quit`, Ctrl-D or Ctrl-C at the command prompt end it.

pub mod command;
pub mod controller;
pub mod render;

use crate::{
    core::{
        OrderFields, OrderId,
        assignment::{Ingredient, IngredientInput},
    },
    errors::Result,
};
use command::{Command, CommandError, HELP, parse_command};
pub use controller::{Controller, Notice};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::{debug, info};

const PROMPT: &str = "taquizas> ";

/// Prompts one line prefilled with `initial`. `None` means the user cancelled.
fn prompt_line(editor: &mut DefaultEditor, label: &str, initial: &str) -> Result<Option<String>> {
    match editor.readline_with_initial(&format!("  {label}: "), (initial, "")) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Prompts each label in turn. `None` if any prompt is cancelled.
fn prompt_form<const N: usize>(
    editor: &mut DefaultEditor,
    labels: [&str; N],
    initial: [&str; N],
) -> Result<Option<[String; N]>> {
    let mut values: [String; N] = std::array::from_fn(|_| String::new());
    for ((value, label), start) in values.iter_mut().zip(labels).zip(initial) {
        match prompt_line(editor, label, start)? {
            Some(line) => *value = line,
            None => return Ok(None),
        }
    }
    Ok(Some(values))
}

fn cancelled() {
    println!("{}", Notice::Info("Cancelled, nothing was saved".to_string()));
}

fn show(result: Result<String>) {
    match result {
        Ok(text) => print!("{text}"),
        Err(err) => println!("{}", Notice::Error(format!("Rendering failed: {err}"))),
    }
}

async fn add(editor: &mut DefaultEditor, controller: &mut Controller) -> Result<()> {
    println!("New order (Ctrl-C cancels)");
    let Some(values) = prompt_form(editor, OrderFields::LABELS, [""; 8])? else {
        cancelled();
        return Ok(());
    };
    println!("{}", controller.add(&OrderFields::from_values(values)).await);
    Ok(())
}

async fn edit(editor: &mut DefaultEditor, controller: &mut Controller, id: OrderId) -> Result<()> {
    let current = match controller.find_order(id).await {
        Ok(found) => found.fields(),
        Err(notice) => {
            println!("{notice}");
            return Ok(());
        }
    };
    println!("Editing order {id} (Ctrl-C cancels)");
    let Some(values) = prompt_form(editor, OrderFields::LABELS, current.values())? else {
        cancelled();
        return Ok(());
    };
    println!(
        "{}",
        controller
            .update(id, &OrderFields::from_values(values))
            .await
    );
    Ok(())
}

async fn delete(editor: &mut DefaultEditor, controller: &mut Controller, id: OrderId) -> Result<()> {
    let target = match controller.find_order(id).await {
        Ok(found) => found,
        Err(notice) => {
            println!("{notice}");
            return Ok(());
        }
    };
    let question = format!(
        "Delete order {id} ({}, {})? [y/N]",
        target.requester_name, target.event_date
    );
    match prompt_line(editor, &question, "")? {
        Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
            println!("{}", controller.delete(id).await);
        }
        _ => cancelled(),
    }
    Ok(())
}

async fn comment(
    editor: &mut DefaultEditor,
    controller: &mut Controller,
    id: OrderId,
) -> Result<()> {
    let current = match controller.find_order(id).await {
        Ok(found) => found.comment.unwrap_or_default(),
        Err(notice) => {
            println!("{notice}");
            return Ok(());
        }
    };
    println!("Comment of order {id} (leave blank to clear, Ctrl-C cancels)");
    match prompt_line(editor, "Comment", &current)? {
        Some(text) => println!("{}", controller.set_comment(id, &text).await),
        None => cancelled(),
    }
    Ok(())
}

async fn assign(
    editor: &mut DefaultEditor,
    controller: &mut Controller,
    id: OrderId,
) -> Result<()> {
    let form = match controller.assignment(id).await {
        Ok(form) => form,
        Err(notice) => {
            println!("{notice}");
            return Ok(());
        }
    };
    println!("Assignment of order {id}, quantities in kg (Ctrl-C cancels)");
    let Some(collaborators) = prompt_line(editor, "Collaborators", &form.collaborators)? else {
        cancelled();
        return Ok(());
    };
    let initial = Ingredient::ALL.map(|ingredient| form.quantities.get(ingredient));
    let Some(values) = prompt_form(editor, Ingredient::ALL.map(Ingredient::label), initial)? else {
        cancelled();
        return Ok(());
    };
    println!(
        "{}",
        controller
            .save_assignment(id, &collaborators, &IngredientInput::new(values))
            .await
    );
    Ok(())
}

/// Runs one command. Returns `false` when the shell should exit.
async fn dispatch(
    editor: &mut DefaultEditor,
    controller: &mut Controller,
    command: Command,
) -> Result<bool> {
    debug!(?command, "Dispatching command");
    match command {
        Command::List => {
            let notice = controller.refresh().await;
            if matches!(notice, Notice::Error(_)) {
                println!("{notice}");
            } else {
                show(render::render_orders(controller.rows(), controller.sort_state()));
            }
        }
        Command::Sort(column) => {
            println!("{}", controller.sort_by(column));
            show(render::render_orders(controller.rows(), controller.sort_state()));
        }
        Command::Add => add(editor, controller).await?,
        Command::Edit(id) => edit(editor, controller, id).await?,
        Command::Delete(id) => delete(editor, controller, id).await?,
        Command::Comment(id) => comment(editor, controller, id).await?,
        Command::Assignments => match controller.assignments().await {
            Ok(rows) => show(render::render_assignments(&rows)),
            Err(notice) => println!("{notice}"),
        },
        Command::Assign(id) => assign(editor, controller, id).await?,
        Command::Stats => match controller.zone_statistics().await {
            Ok(report) => show(render::render_zone_report(&report)),
            Err(notice) => println!("{notice}"),
        },
        Command::Forecast => match controller.forecast().await {
            Ok(forecast) => show(render::render_forecast(&forecast)),
            Err(notice) => println!("{notice}"),
        },
        Command::Segments => match controller.segments().await {
            Ok(report) => show(render::render_segments(&report)),
            Err(notice) => println!("{notice}"),
        },
        Command::Sentiment => match controller.sentiments().await {
            Ok(results) => show(render::render_sentiments(&results)),
            Err(notice) => println!("{notice}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Runs the interactive shell until the user quits.
///
/// # Errors
/// Returns an error only if the terminal itself fails.
pub async fn run(mut controller: Controller) -> Result<()> {
    let mut editor = DefaultEditor::new()?;

    let notice = controller.refresh().await;
    println!("{notice}");
    if !matches!(notice, Notice::Error(_)) {
        show(render::render_orders(controller.rows(), controller.sort_state()));
    }
    println!("Type `help` for the list of commands.");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        match parse_command(&line) {
            Ok(command) => {
                if !dispatch(&mut editor, &mut controller, command).await? {
                    break;
                }
            }
            Err(CommandError::Empty) => {}
            Err(err) => println!("{}", Notice::Warning(err.to_string())),
        }
    }

    info!("Shell closed");
    Ok(())
}
