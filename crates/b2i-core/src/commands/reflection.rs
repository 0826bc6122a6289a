use std::io::Write;

use b2i_shared::calendar::{month_label, month_of, week_label, week_monday};
use b2i_shared::checkin::{MonthlyDraft, Score, ScoreArea, WeeklyDraft};
use chrono::NaiveDate;
use tracing::instrument;

use super::Workspace;
use crate::cli::{CheckinCommand, ReviewCommand, SaveCheckinArgs, SaveReviewArgs};
use crate::render::Renderer;
use crate::stores::{MetricsStore, MonthlyReviewStore, WeeklyCheckinStore};

#[instrument(skip(ws, renderer, out))]
pub(super) fn checkin(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<CheckinCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let mut store = WeeklyCheckinStore::new(ws.client(), Some(user), ws.cfg.checkin_recent()?);

    match action.unwrap_or(CheckinCommand::Show { week: None }) {
        CheckinCommand::Show { week } => {
            let week_of = week_start(ws, week.as_deref())?;
            store.load(week_of)?;
            renderer.print_weekly(out, week_of, store.current(), store.recent())
        }
        CheckinCommand::Save(args) => {
            let week_of = week_start(ws, args.week.as_deref())?;
            store.load(week_of)?;
            let mut draft = store.draft();
            apply_scores(&mut draft, &args);
            if let Some(note) = args.equanimity {
                draft.equanimity_note = note;
            }
            if let Some(note) = args.flag {
                draft.flag_note = note;
            }
            store.save(draft, week_of)?;
            writeln!(out, "Saved check-in for the week of {}.", week_label(week_of))?;
            Ok(())
        }
    }
}

fn apply_scores(draft: &mut WeeklyDraft, args: &SaveCheckinArgs) {
    let given = [
        (ScoreArea::Body, args.body),
        (ScoreArea::Mind, args.mind),
        (ScoreArea::Work, args.work),
        (ScoreArea::Energy, args.energy),
    ];
    for (area, value) in given {
        if let Some(score) = value.and_then(Score::new) {
            draft.set_score(area, Some(score));
        }
    }
}

fn week_start(ws: &Workspace, raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    let date = match raw {
        Some(raw) => ws.clock.parse_date(raw)?,
        None => ws.clock.today(),
    };
    Ok(week_monday(date))
}

fn month_start(ws: &Workspace, raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    let date = match raw {
        Some(raw) => ws.clock.parse_date(raw)?,
        None => ws.clock.today(),
    };
    Ok(month_of(date))
}

#[instrument(skip(ws, renderer, out))]
pub(super) fn review(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    action: Option<ReviewCommand>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let mut store = MonthlyReviewStore::new(ws.client(), Some(user));

    match action.unwrap_or(ReviewCommand::Show { month: None }) {
        ReviewCommand::Show { month } => {
            let month_of = month_start(ws, month.as_deref())?;
            store.fetch(month_of)?;
            renderer.print_monthly(out, month_of, store.current())
        }
        ReviewCommand::Save(args) => {
            let month_of = month_start(ws, args.month.as_deref())?;
            store.fetch(month_of)?;
            let draft = merge_review(store.draft(), args);
            store.save(draft, month_of)?;
            writeln!(out, "Saved review for {}.", month_label(month_of))?;
            Ok(())
        }
    }
}

fn merge_review(mut draft: MonthlyDraft, args: SaveReviewArgs) -> MonthlyDraft {
    if let Some(note) = args.trends {
        draft.trends_note = note;
    }
    if let Some(note) = args.keystone {
        draft.keystone_note = note;
    }
    if let Some(note) = args.next_why {
        draft.next_why_note = note;
    }
    if let Some(note) = args.adjust {
        draft.adjust_note = note;
    }
    draft
}

#[instrument(skip(ws, renderer, out))]
pub(super) fn metrics(
    ws: &mut Workspace,
    renderer: &Renderer,
    out: &mut dyn Write,
    weeks: Option<usize>,
) -> anyhow::Result<()> {
    let user = ws.require_user()?;
    let weeks = match weeks {
        Some(weeks) => weeks,
        None => ws.cfg.metrics_weeks()?,
    };
    let mut store = MetricsStore::new(ws.client(), Some(user));
    store.load(Some(weeks))?;
    renderer.print_metrics(out, store.metrics())
}
