use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};
use uuid::Uuid;

use crate::checkin::Score;

pub const GOALS_TABLE: &str = "goals";
pub const KANBAN_CARDS_TABLE: &str =
  "kanban_cards";
pub const CHECKLIST_ITEMS_TABLE: &str =
  "checklist_items";
pub const WEEKLY_CHECKINS_TABLE: &str =
  "weekly_checkins";
pub const MONTHLY_REVIEWS_TABLE: &str =
  "monthly_reviews";
pub const USER_SETTINGS_TABLE: &str =
  "user_settings";

pub const DEFAULT_FOOTER_MESSAGE: &str =
  "This year, I am choosing to be a \
   leader who is strong, healthy, and \
   equanimous – even when it would be \
   easier to push, rush, or take over.";

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub enum ColumnId {
  #[serde(rename = "todo")]
  Todo,
  #[serde(rename = "in-progress")]
  InProgress,
  #[serde(rename = "complete")]
  Complete
}

impl ColumnId {
  pub const ALL: [ColumnId; 3] = [
    ColumnId::Todo,
    ColumnId::InProgress,
    ColumnId::Complete
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | ColumnId::Todo => "todo",
      | ColumnId::InProgress => {
        "in-progress"
      }
      | ColumnId::Complete => "complete"
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      | ColumnId::Todo => "To Do",
      | ColumnId::InProgress => {
        "In Progress"
      }
      | ColumnId::Complete => "Complete"
    }
  }

  pub fn subtitle(
    self
  ) -> &'static str {
    match self {
      | ColumnId::Todo => "Queued tasks",
      | ColumnId::InProgress => {
        "Active work"
      }
      | ColumnId::Complete => "Finished"
    }
  }
}

impl fmt::Display for ColumnId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ColumnId {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "todo" | "to-do" | "to_do" => {
        Ok(ColumnId::Todo)
      }
      | "in-progress"
      | "in_progress"
      | "inprogress"
      | "doing" => {
        Ok(ColumnId::InProgress)
      }
      | "complete" | "completed"
      | "done" => Ok(ColumnId::Complete),
      | other => {
        Err(format!(
          "unknown column: {other}"
        ))
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  Medium,
  High
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      | Priority::Low => "low",
      | Priority::Medium => "medium",
      | Priority::High => "high"
    }
  }
}

impl fmt::Display for Priority {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Priority {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "low" | "l" => Ok(Priority::Low),
      | "medium" | "med" | "m" => {
        Ok(Priority::Medium)
      }
      | "high" | "h" => {
        Ok(Priority::High)
      }
      | other => {
        Err(format!(
          "unknown priority: {other}"
        ))
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct User {
  pub id:    Uuid,
  #[serde(default)]
  pub email: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Goal {
  pub id:           Uuid,
  pub title:        String,
  #[serde(default)]
  pub is_completed: bool,
  pub created_at:   DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGoal {
  pub user_id: Uuid,
  pub title:   String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Default,
  PartialEq,
)]
pub struct GoalPatch {
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub title:        Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub is_completed: Option<bool>
}

impl GoalPatch {
  pub fn apply(&self, goal: &mut Goal) {
    if let Some(title) = &self.title {
      goal.title = title.clone();
    }
    if let Some(done) = self.is_completed
    {
      goal.is_completed = done;
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct KanbanCard {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  pub column_id:   ColumnId,
  #[serde(default)]
  pub priority:    Option<Priority>,
  #[serde(default)]
  pub due_date:    Option<NaiveDate>,
  #[serde(default)]
  pub is_archived: bool,
  #[serde(default)]
  pub position:    i32,
  pub created_at:  DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct NewKanbanCard {
  pub user_id:   Uuid,
  pub title:     String,
  pub column_id: ColumnId,
  pub priority:  Option<Priority>,
  pub due_date:  Option<NaiveDate>,
  pub position:  i32
}

/// Partial card update. Only the fields
/// that are `Some` are written; the
/// nested options distinguish "clear"
/// from "leave alone".
#[derive(
  Debug,
  Clone,
  Serialize,
  Default,
  PartialEq,
)]
pub struct CardPatch {
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub title:       Option<String>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<Option<String>>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub column_id:   Option<ColumnId>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:
    Option<Option<Priority>>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:
    Option<Option<NaiveDate>>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub is_archived: Option<bool>,
  #[serde(
    skip_serializing_if = "Option::is_none"
  )]
  pub position:    Option<i32>
}

impl CardPatch {
  pub fn archived(
    is_archived: bool
  ) -> Self {
    Self {
      is_archived: Some(is_archived),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn apply(
    &self,
    card: &mut KanbanCard
  ) {
    if let Some(title) = &self.title {
      card.title = title.clone();
    }
    if let Some(description) =
      &self.description
    {
      card.description =
        description.clone();
    }
    if let Some(column_id) =
      self.column_id
    {
      card.column_id = column_id;
    }
    if let Some(priority) = self.priority
    {
      card.priority = priority;
    }
    if let Some(due_date) = self.due_date
    {
      card.due_date = due_date;
    }
    if let Some(is_archived) =
      self.is_archived
    {
      card.is_archived = is_archived;
    }
    if let Some(position) = self.position
    {
      card.position = position;
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct ChecklistItem {
  pub id:         Uuid,
  pub label:      String,
  #[serde(default)]
  pub is_checked: bool,
  #[serde(default)]
  pub position:   i32,
  pub created_at: DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChecklistItem {
  pub user_id:    Uuid,
  pub label:      String,
  pub is_checked: bool,
  pub position:   i32
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct WeeklyCheckin {
  pub id:              Uuid,
  pub week_of:         NaiveDate,
  #[serde(default)]
  pub score_body:      Option<Score>,
  #[serde(default)]
  pub score_mind:      Option<Score>,
  #[serde(default)]
  pub score_work:      Option<Score>,
  #[serde(default)]
  pub score_energy:    Option<Score>,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub equanimity_note: String,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub flag_note:       String,
  pub created_at:      DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyCheckinUpsert {
  pub user_id:         Uuid,
  pub week_of:         NaiveDate,
  pub score_body:      Option<Score>,
  pub score_mind:      Option<Score>,
  pub score_work:      Option<Score>,
  pub score_energy:    Option<Score>,
  pub equanimity_note: String,
  pub flag_note:       String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct MonthlyReview {
  pub id:            Uuid,
  pub month_of:      NaiveDate,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub trends_note:   String,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub keystone_note: String,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub next_why_note: String,
  #[serde(
    default,
    deserialize_with = "null_as_empty"
  )]
  pub adjust_note:   String,
  pub created_at:    DateTime<Utc>
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReviewUpsert {
  pub user_id:       Uuid,
  pub month_of:      NaiveDate,
  pub trends_note:   String,
  pub keystone_note: String,
  pub next_why_note: String,
  pub adjust_note:   String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct UserSettings {
  pub footer_message: String,
  #[serde(default)]
  pub updated_at:
    Option<DateTime<Utc>>
}

impl Default for UserSettings {
  fn default() -> Self {
    Self {
      footer_message:
        DEFAULT_FOOTER_MESSAGE
          .to_string(),
      updated_at:     None
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUserSettings {
  pub user_id:        Uuid,
  pub footer_message: String
}

#[derive(Debug, Clone, Serialize)]
pub struct FooterUpdate {
  pub footer_message: String,
  pub updated_at:     DateTime<Utc>
}

/// Trims user input and rejects blank
/// titles, labels and messages.
pub fn normalize_text(
  raw: &str
) -> Option<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

/// First eight characters of an id, as
/// shown in listings.
pub fn short_id(id: &Uuid) -> String {
  id.simple().to_string()[..8]
    .to_string()
}

fn null_as_empty<'de, D>(
  deserializer: D
) -> Result<String, D::Error>
where
  D: Deserializer<'de>
{
  Ok(
    Option::<String>::deserialize(
      deserializer
    )?
    .unwrap_or_default()
  )
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  #[test]
  fn card_row_ignores_owner_and_maps_columns() {
    let row = json!({
      "id": "7f4f8d5e-3c1a-4f8e-9b7a-2d9e1c0b6a11",
      "user_id": "0f0f8d5e-3c1a-4f8e-9b7a-2d9e1c0b6a11",
      "title": "Ship release notes",
      "description": null,
      "column_id": "in-progress",
      "priority": "high",
      "due_date": "2026-03-02",
      "is_archived": false,
      "position": 2,
      "created_at": "2026-02-27T09:15:00.123456+00:00"
    });

    let card: KanbanCard =
      serde_json::from_value(row)
        .expect("card row");
    assert_eq!(
      card.column_id,
      ColumnId::InProgress
    );
    assert_eq!(
      card.priority,
      Some(Priority::High)
    );
    assert_eq!(card.description, None);
    assert_eq!(
      card.due_date,
      NaiveDate::from_ymd_opt(2026, 3, 2)
    );
  }

  #[test]
  fn null_notes_read_as_empty() {
    let row = json!({
      "id": "7f4f8d5e-3c1a-4f8e-9b7a-2d9e1c0b6a11",
      "week_of": "2026-02-23",
      "score_body": 4,
      "score_mind": null,
      "equanimity_note": null,
      "created_at": "2026-02-27T09:15:00+00:00"
    });

    let checkin: WeeklyCheckin =
      serde_json::from_value(row)
        .expect("checkin row");
    assert_eq!(
      checkin.equanimity_note,
      ""
    );
    assert_eq!(checkin.flag_note, "");
    assert_eq!(
      checkin
        .score_body
        .map(|score| score.value()),
      Some(4)
    );
    assert_eq!(checkin.score_mind, None);
  }

  #[test]
  fn card_patch_only_serializes_set_fields() {
    let patch = CardPatch {
      column_id: Some(
        ColumnId::Complete
      ),
      due_date: Some(None),
      ..CardPatch::default()
    };

    assert_eq!(
      serde_json::to_value(&patch)
        .expect("patch json"),
      json!({
        "column_id": "complete",
        "due_date": null
      })
    );
  }

  #[test]
  fn column_aliases_parse() {
    assert_eq!(
      "doing".parse::<ColumnId>(),
      Ok(ColumnId::InProgress)
    );
    assert_eq!(
      "Done".parse::<ColumnId>(),
      Ok(ColumnId::Complete)
    );
    assert!(
      "later".parse::<ColumnId>().is_err()
    );
  }
}
