use std::io::Write;

use b2i_shared::board::CardDraft;
use b2i_shared::model::{CardPatch, ColumnId, normalize_text, short_id};
use tracing::instrument;
use uuid::Uuid;

use super::{Workspace, report_unchanged, resolve_id};
use crate::cli::{BoardCommand, EditCardArgs, GoalsCommand, join_words};
use crate::render::Renderer;
use crate::stores::{BoardStore, GoalsStore};

#[instrument(skip(ws, renderer, out))]
pub(super) fn goals(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<GoalsCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let mut store = GoalsStore::new(ws.client(), Some(user));
    store.load()?;

    match action.unwrap_or(GoalsCommand::List) {
        GoalsCommand::List => renderer.print_goals(out, store.goals()),
        GoalsCommand::Add { title } => match store.add(&join_words(&title))? {
            Some(goal) => {
                writeln!(out, "Added goal {}.", short_id(&goal.id))?;
                Ok(())
            }
            None => report_unchanged(out, "goal title is empty"),
        },
        GoalsCommand::Toggle { id } => {
            let id = goal_id(&store, &id)?;
            store.toggle(id)?;
            let done = store.find(id).is_some_and(|goal| goal.is_completed);
            let state = if done { "complete" } else { "open" };
            writeln!(out, "Goal {} is {state}.", short_id(&id))?;
            Ok(())
        }
        GoalsCommand::Rename { id, title } => {
            let id = goal_id(&store, &id)?;
            if store.rename(id, &join_words(&title))? {
                writeln!(out, "Renamed goal {}.", short_id(&id))?;
                Ok(())
            } else {
                report_unchanged(out, "goal title is empty")
            }
        }
        GoalsCommand::Rm { id } => {
            let id = goal_id(&store, &id)?;
            store.delete(id)?;
            writeln!(out, "Deleted goal {}.", short_id(&id))?;
            Ok(())
        }
    }
}

fn goal_id(store: &GoalsStore, prefix: &str) -> anyhow::Result<Uuid> {
    resolve_id(prefix, store.goals().iter().map(|goal| goal.id), "goal")
}

#[instrument(skip(ws, renderer, out))]
pub(super) fn board(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<BoardCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let today = ws.clock.today();
    let mut store = BoardStore::new(ws.client(), Some(user));
    store.load()?;

    match action.unwrap_or(BoardCommand::Show) {
        BoardCommand::Show => {
            let columns: Vec<_> = ColumnId::ALL
                .iter()
                .map(|column| (*column, store.column_cards(*column)))
                .collect();
            renderer.print_board(out, &columns, today)
        }
        BoardCommand::Add {
            title,
            column,
            due,
            priority,
        } => {
            let due_date = due.map(|raw| ws.clock.parse_date(&raw)).transpose()?;
            let draft = CardDraft {
                column_id: column,
                due_date,
                priority,
                ..CardDraft::new(join_words(&title))
            };
            match store.add(draft)? {
                Some(card) => {
                    writeln!(
                        out,
                        "Added card {} to {}.",
                        short_id(&card.id),
                        card.column_id.title()
                    )?;
                    Ok(())
                }
                None => report_unchanged(out, "card title is empty"),
            }
        }
        BoardCommand::Edit(args) => {
            let id = card_id(&store, &args.id)?;
            let patch = card_patch(ws, &args)?;
            if store.update(id, patch)? {
                writeln!(out, "Updated card {}.", short_id(&id))?;
                Ok(())
            } else {
                report_unchanged(out, "nothing to change")
            }
        }
        BoardCommand::Move { id, column, index } => {
            let id = card_id(&store, &id)?;
            if store.move_card(id, column, index)? {
                let position = store.find(id).map(|card| card.position).unwrap_or_default();
                writeln!(
                    out,
                    "Moved card {} to {} at position {position}.",
                    short_id(&id),
                    column.title()
                )?;
                Ok(())
            } else {
                report_unchanged(out, "card not found")
            }
        }
        BoardCommand::Archive { id } => {
            let id = card_id(&store, &id)?;
            store.archive(id)?;
            writeln!(out, "Archived card {}.", short_id(&id))?;
            Ok(())
        }
        BoardCommand::Restore { id } => {
            let id = card_id(&store, &id)?;
            store.unarchive(id)?;
            writeln!(out, "Restored card {}.", short_id(&id))?;
            Ok(())
        }
        BoardCommand::Archived => {
            let archived = store.archived_cards();
            if archived.is_empty() {
                writeln!(out, "No archived cards.")?;
                return Ok(());
            }
            renderer.print_cards(out, &archived, today)
        }
        BoardCommand::Rm { id } => {
            let id = card_id(&store, &id)?;
            store.delete(id)?;
            writeln!(out, "Deleted card {}.", short_id(&id))?;
            Ok(())
        }
    }
}

fn card_id(store: &BoardStore, prefix: &str) -> anyhow::Result<Uuid> {
    resolve_id(prefix, store.cards().iter().map(|card| card.id), "card")
}

fn card_patch(ws: &Workspace, args: &EditCardArgs) -> anyhow::Result<CardPatch> {
    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due
            .as_deref()
            .map(|raw| ws.clock.parse_date(raw).map(Some))
            .transpose()?
    };
    let priority = if args.clear_priority {
        Some(None)
    } else {
        args.priority.map(Some)
    };

    Ok(CardPatch {
        title: args.title.clone(),
        description: args.description.as_deref().map(normalize_text),
        priority,
        due_date,
        ..CardPatch::default()
    })
}
