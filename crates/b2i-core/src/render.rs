use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use b2i_shared::calendar::{month_label, week_label};
use b2i_shared::checkin::{
    ADJUST_PROMPT, CheckinKind, DatedNote, EQUANIMITY_PROMPT, FLAG_PROMPT, KEYSTONE_PROMPT,
    NEXT_WHY_PROMPT, Score, ScoreArea, ScoreTone, TRENDS_PROMPT, WeeklyMetrics,
};
use b2i_shared::checklist::Progress;
use b2i_shared::model::{
    ChecklistItem, ColumnId, Goal, KanbanCard, MonthlyReview, Priority, WeeklyCheckin, short_id,
};
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, goals))]
    pub fn print_goals(&self, out: &mut dyn Write, goals: &[Goal]) -> anyhow::Result<()> {
        if goals.is_empty() {
            writeln!(out, "No goals yet.")?;
            return Ok(());
        }

        let headers = vec!["ID".to_string(), "Done".to_string(), "Goal".to_string()];
        let rows = goals
            .iter()
            .map(|goal| {
                let done = if goal.is_completed { "x" } else { " " };
                let title = if goal.is_completed {
                    self.paint(&goal.title, "2")
                } else {
                    goal.title.clone()
                };
                vec![
                    self.paint(&short_id(&goal.id), "33"),
                    format!("[{done}]"),
                    title,
                ]
            })
            .collect();
        write_table(&mut *out, headers, rows)?;

        let completed = goals.iter().filter(|goal| goal.is_completed).count();
        writeln!(out)?;
        writeln!(out, "{completed}/{} complete", goals.len())?;
        Ok(())
    }

    /// One section per column, cards in position order.
    #[tracing::instrument(skip(self, out, columns, today))]
    pub fn print_board(
        &self,
        out: &mut dyn Write,
        columns: &[(ColumnId, Vec<&KanbanCard>)],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        for (idx, (column, cards)) in columns.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            writeln!(
                out,
                "{} ({}) {}",
                self.paint(column.title(), "1"),
                cards.len(),
                self.paint(column.subtitle(), "2")
            )?;
            if cards.is_empty() {
                writeln!(out, "  (empty)")?;
                continue;
            }
            self.print_cards(out, cards, today)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, cards, today))]
    pub fn print_cards(
        &self,
        out: &mut dyn Write,
        cards: &[&KanbanCard],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Column".to_string(),
            "Priority".to_string(),
            "Due".to_string(),
            "Title".to_string(),
        ];

        let rows = cards
            .iter()
            .map(|card| {
                let due = card
                    .due_date
                    .map(|date| {
                        let text = date.format("%Y-%m-%d").to_string();
                        if date < today && card.column_id != ColumnId::Complete {
                            self.paint(&text, "31")
                        } else {
                            text
                        }
                    })
                    .unwrap_or_default();
                let priority = card
                    .priority
                    .map(|priority| self.paint_priority(priority))
                    .unwrap_or_default();
                let title = match &card.description {
                    Some(description) => format!("{} - {description}", card.title),
                    None => card.title.clone(),
                };
                vec![
                    self.paint(&short_id(&card.id), "33"),
                    card.column_id.as_str().to_string(),
                    priority,
                    due,
                    title,
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, items))]
    pub fn print_checklist(
        &self,
        out: &mut dyn Write,
        items: &[ChecklistItem],
        progress: Progress,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "#".to_string(),
            "ID".to_string(),
            "Done".to_string(),
            "Item".to_string(),
        ];
        let rows = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let done = if item.is_checked { "x" } else { " " };
                vec![
                    idx.to_string(),
                    self.paint(&short_id(&item.id), "33"),
                    format!("[{done}]"),
                    item.label.clone(),
                ]
            })
            .collect();
        write_table(&mut *out, headers, rows)?;

        writeln!(out)?;
        let summary = format!(
            "{}/{} done ({}%)",
            progress.completed,
            progress.total,
            progress.rounded()
        );
        if progress.is_complete() {
            writeln!(out, "{}", self.paint(&format!("{summary} - shutdown complete"), "32"))?;
        } else {
            writeln!(out, "{summary}")?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, out, current, recent))]
    pub fn print_weekly(
        &self,
        out: &mut dyn Write,
        week_of: NaiveDate,
        current: Option<&WeeklyCheckin>,
        recent: &[WeeklyCheckin],
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} - week of {}",
            self.paint(CheckinKind::Weekly.title(), "1"),
            week_label(week_of)
        )?;
        let Some(checkin) = current else {
            writeln!(out, "Not saved yet.")?;
            return self.print_recent(out, recent);
        };

        for area in ScoreArea::ALL {
            writeln!(
                out,
                "  {:<7} {}  {}",
                area.label(),
                self.score_cell(area.score_of(checkin)),
                self.paint(area.question(), "2")
            )?;
        }
        write_note(out, EQUANIMITY_PROMPT, &checkin.equanimity_note)?;
        write_note(out, FLAG_PROMPT, &checkin.flag_note)?;
        self.print_recent(out, recent)
    }

    fn print_recent(&self, out: &mut dyn Write, recent: &[WeeklyCheckin]) -> anyhow::Result<()> {
        if recent.is_empty() {
            return Ok(());
        }
        writeln!(out)?;
        writeln!(out, "Recent")?;
        let mut headers = vec!["Week".to_string()];
        headers.extend(ScoreArea::ALL.iter().map(|area| area.label().to_string()));
        let rows = recent
            .iter()
            .map(|checkin| {
                let mut row = vec![week_label(checkin.week_of)];
                row.extend(
                    ScoreArea::ALL
                        .iter()
                        .map(|area| self.score_cell(area.score_of(checkin))),
                );
                row
            })
            .collect();
        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, review))]
    pub fn print_monthly(
        &self,
        out: &mut dyn Write,
        month_of: NaiveDate,
        review: Option<&MonthlyReview>,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} - {}",
            self.paint(CheckinKind::Monthly.title(), "1"),
            month_label(month_of)
        )?;
        let Some(review) = review else {
            writeln!(out, "Not saved yet.")?;
            return Ok(());
        };
        write_note(out, TRENDS_PROMPT, &review.trends_note)?;
        write_note(out, KEYSTONE_PROMPT, &review.keystone_note)?;
        write_note(out, NEXT_WHY_PROMPT, &review.next_why_note)?;
        write_note(out, ADJUST_PROMPT, &review.adjust_note)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out))]
    pub fn print_today(
        &self,
        out: &mut dyn Write,
        today: NaiveDate,
        kind: CheckinKind,
        saved: bool,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", today.format("%A, %B %-d, %Y"))?;
        let state = if saved {
            self.paint("saved", "32")
        } else {
            self.paint("not saved yet", "33")
        };
        writeln!(
            out,
            "{}: {} ({state})",
            self.paint(kind.title(), "1"),
            kind.blurb()
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, metrics))]
    pub fn print_metrics(&self, out: &mut dyn Write, metrics: &WeeklyMetrics) -> anyhow::Result<()> {
        if metrics.checkins.is_empty() {
            writeln!(out, "No check-ins yet. Save a weekly check-in to see trends.")?;
            return Ok(());
        }

        let plural = if metrics.streak == 1 { "" } else { "s" };
        writeln!(
            out,
            "Streak: {} week{plural}",
            self.paint(&metrics.streak.to_string(), "1")
        )?;
        writeln!(out)?;

        let headers = vec!["Area".to_string(), "Average".to_string()];
        let rows = ScoreArea::ALL
            .iter()
            .map(|area| {
                let average = match metrics.averages.get(*area) {
                    Some(value) => self.paint_tone(&format!("{value:.1}"), ScoreTone::of(value)),
                    None => "-".to_string(),
                };
                vec![area.label().to_string(), average]
            })
            .collect();
        write_table(&mut *out, headers, rows)?;

        writeln!(out)?;
        writeln!(out, "Trends")?;
        let mut headers = vec!["Week".to_string()];
        headers.extend(ScoreArea::ALL.iter().map(|area| area.label().to_string()));
        let rows = metrics
            .timeline()
            .map(|checkin| {
                let mut row = vec![week_label(checkin.week_of)];
                row.extend(
                    ScoreArea::ALL
                        .iter()
                        .map(|area| self.score_cell(area.score_of(checkin))),
                );
                row
            })
            .collect();
        write_table(&mut *out, headers, rows)?;

        write_dated_notes(out, "Equanimity", &metrics.equanimity_notes())?;
        write_dated_notes(out, "Flags", &metrics.flags())?;
        Ok(())
    }

    pub fn print_footer(&self, out: &mut dyn Write, message: &str) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(message, "3"))?;
        Ok(())
    }

    fn score_cell(&self, score: Option<Score>) -> String {
        match score {
            Some(score) => self.paint_tone(
                &score.value().to_string(),
                ScoreTone::of(f64::from(score.value())),
            ),
            None => "-".to_string(),
        }
    }

    fn paint_tone(&self, text: &str, tone: ScoreTone) -> String {
        let code = match tone {
            ScoreTone::Strong => "32",
            ScoreTone::Steady => "33",
            ScoreTone::Low => "31",
        };
        self.paint(text, code)
    }

    fn paint_priority(&self, priority: Priority) -> String {
        let code = match priority {
            Priority::High => "31",
            Priority::Medium => "33",
            Priority::Low => "36",
        };
        self.paint(priority.as_str(), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_note(out: &mut dyn Write, prompt: &str, note: &str) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(out, "{prompt}")?;
    if note.trim().is_empty() {
        writeln!(out, "  -")?;
    } else {
        for line in note.lines() {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}

fn write_dated_notes(out: &mut dyn Write, title: &str, notes: &[DatedNote]) -> anyhow::Result<()> {
    if notes.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{title}")?;
    for note in notes {
        writeln!(out, "  {}  {}", week_label(note.week_of), note.note)?;
    }
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}"))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            if idx > 0 {
                line.push(' ');
            }
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            line.push_str(cell);
            line.push_str(&" ".repeat(padding));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    fn render(f: impl FnOnce(&mut dyn Write) -> anyhow::Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn strip_ansi_removes_escapes() {
        assert_eq!(strip_ansi("\x1b[31mlate\x1b[0m"), "late");
    }

    #[test]
    fn table_aligns_colored_cells() {
        let text = render(|out| {
            write_table(
                out,
                vec!["A".to_string(), "B".to_string()],
                vec![
                    vec!["\x1b[33mlong\x1b[0m".to_string(), "x".to_string()],
                    vec!["s".to_string(), "y".to_string()],
                ],
            )
        });
        let plain = strip_ansi(&text);
        assert_eq!(plain, "A    B\n---- -\nlong x\ns    y\n");
    }

    #[test]
    fn checklist_shows_progress() {
        let items = vec![
            ChecklistItem {
                id: Uuid::from_u128(1),
                label: "Inbox zero".to_string(),
                is_checked: true,
                position: 0,
                created_at: DateTime::default(),
            },
            ChecklistItem {
                id: Uuid::from_u128(2),
                label: "Plan Monday".to_string(),
                is_checked: false,
                position: 1,
                created_at: DateTime::default(),
            },
        ];
        let renderer = Renderer::plain();
        let text = render(|out| renderer.print_checklist(out, &items, Progress::of(&items)));
        assert!(text.contains("[x]  Inbox zero"));
        assert!(text.ends_with("1/2 done (50%)\n"));
    }

    #[test]
    fn empty_metrics_prompt_for_a_checkin() {
        let renderer = Renderer::plain();
        let metrics = WeeklyMetrics::from_checkins(Vec::new());
        let text = render(|out| renderer.print_metrics(out, &metrics));
        assert!(text.starts_with("No check-ins yet."));
    }
}
