use std::io::Write;

use b2i_shared::calendar::{month_of, week_monday};
use b2i_shared::checkin::CheckinKind;
use b2i_shared::model::short_id;
use tracing::instrument;
use uuid::Uuid;

use super::{Workspace, report_unchanged, resolve_id};
use crate::cli::{ChecklistCommand, FooterCommand, join_words};
use crate::render::Renderer;
use crate::stores::{ChecklistStore, MonthlyReviewStore, SettingsStore, WeeklyCheckinStore};

#[instrument(skip(ws, renderer, out))]
pub(super) fn checklist(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<ChecklistCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let mut store = ChecklistStore::new(ws.client(), Some(user));
    store.load()?;

    match action.unwrap_or(ChecklistCommand::Show) {
        ChecklistCommand::Show => renderer.print_checklist(out, store.items(), store.progress()),
        ChecklistCommand::Check { id } => {
            let id = item_id(&store, &id)?;
            store.toggle(id)?;
            let progress = store.progress();
            writeln!(
                out,
                "{}/{} done ({}%).",
                progress.completed,
                progress.total,
                progress.rounded()
            )?;
            Ok(())
        }
        ChecklistCommand::Add { label } => match store.add(&join_words(&label))? {
            Some(item) => {
                writeln!(out, "Added item {}.", short_id(&item.id))?;
                Ok(())
            }
            None => report_unchanged(out, "label is empty"),
        },
        ChecklistCommand::Rm { id } => {
            let id = item_id(&store, &id)?;
            store.remove(id)?;
            writeln!(out, "Removed item {}.", short_id(&id))?;
            Ok(())
        }
        ChecklistCommand::Reset => {
            store.reset_all()?;
            writeln!(out, "Checklist reset.")?;
            Ok(())
        }
        ChecklistCommand::Move { from, to } => {
            if store.reorder(from, to)? {
                renderer.print_checklist(out, store.items(), store.progress())
            } else {
                report_unchanged(out, "no item at that index")
            }
        }
    }
}

fn item_id(store: &ChecklistStore, prefix: &str) -> anyhow::Result<Uuid> {
    resolve_id(prefix, store.items().iter().map(|item| item.id), "checklist item")
}

#[instrument(skip(ws, renderer, out))]
pub(super) fn footer(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<FooterCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let mut store = SettingsStore::new(ws.client(), Some(user));
    store.load()?;

    match action.unwrap_or(FooterCommand::Show) {
        FooterCommand::Show => renderer.print_footer(out, store.footer_message()),
        FooterCommand::Set { message } => {
            if store.update_footer_message(&join_words(&message), ws.clock.now())? {
                renderer.print_footer(out, store.footer_message())
            } else {
                report_unchanged(out, "message is empty")
            }
        }
    }
}

/// Shows which reflection is due today and whether it is saved, followed by
/// the footer.
#[instrument(skip(ws, renderer, out))]
pub(super) fn today(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let today = ws.clock.today();
    let kind = CheckinKind::for_date(today);

    let saved = match kind {
        CheckinKind::Weekly => {
            let store = WeeklyCheckinStore::new(ws.client(), Some(user.clone()), 0);
            store.fetch(week_monday(today))?.is_some()
        }
        CheckinKind::Monthly => {
            let mut store = MonthlyReviewStore::new(ws.client(), Some(user.clone()));
            store.fetch(month_of(today))?.is_some()
        }
    };
    renderer.print_today(out, today, kind, saved)?;

    let mut settings = SettingsStore::new(ws.client(), Some(user));
    settings.load()?;
    writeln!(out)?;
    renderer.print_footer(out, settings.footer_message())
}
