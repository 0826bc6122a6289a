use std::fmt;

use chrono::NaiveDate;
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

use crate::calendar::is_last_friday_of_month;
use crate::model::{
  MonthlyReview,
  MonthlyReviewUpsert,
  WeeklyCheckin,
  WeeklyCheckinUpsert
};

/// A gut-check score from 1 to 5.
#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: u8) -> Option<Self> {
    (Self::MIN..=Self::MAX)
      .contains(&value)
      .then_some(Self(value))
  }

  pub fn value(self) -> u8 {
    self.0
  }

  pub fn all() -> impl Iterator<Item = Score>
  {
    (Self::MIN..=Self::MAX).map(Score)
  }

  pub fn tone(self) -> ScoreTone {
    ScoreTone::of(f64::from(self.0))
  }

  /// Clicking the selected score clears
  /// the selection; any other score
  /// replaces it.
  pub fn toggle(
    current: Option<Score>,
    clicked: Score
  ) -> Option<Score> {
    if current == Some(clicked) {
      None
    } else {
      Some(clicked)
    }
  }
}

impl TryFrom<u8> for Score {
  type Error = String;

  fn try_from(
    value: u8
  ) -> Result<Self, Self::Error> {
    Score::new(value).ok_or_else(|| {
      format!(
        "score must be between 1 and 5, \
         got {value}"
      )
    })
  }
}

impl From<Score> for u8 {
  fn from(score: Score) -> Self {
    score.0
  }
}

impl fmt::Display for Score {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub enum ScoreTone {
  Strong,
  Steady,
  Low
}

impl ScoreTone {
  pub fn of(value: f64) -> Self {
    if value >= 4.0 {
      ScoreTone::Strong
    } else if value >= 3.0 {
      ScoreTone::Steady
    } else {
      ScoreTone::Low
    }
  }

  pub fn css_class(
    self
  ) -> &'static str {
    match self {
      | ScoreTone::Strong => "tone-strong",
      | ScoreTone::Steady => "tone-steady",
      | ScoreTone::Low => "tone-low"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
)]
pub enum ScoreArea {
  Body,
  Mind,
  Work,
  Energy
}

impl ScoreArea {
  pub const ALL: [ScoreArea; 4] = [
    ScoreArea::Body,
    ScoreArea::Mind,
    ScoreArea::Work,
    ScoreArea::Energy
  ];

  pub fn label(self) -> &'static str {
    match self {
      | ScoreArea::Body => "Body",
      | ScoreArea::Mind => "Mind",
      | ScoreArea::Work => "Work",
      | ScoreArea::Energy => "Energy"
    }
  }

  pub fn question(
    self
  ) -> &'static str {
    match self {
      | ScoreArea::Body => {
        "Did I train consistently without \
         injury?"
      }
      | ScoreArea::Mind => {
        "Did I read morning/evening most \
         days?"
      }
      | ScoreArea::Work => {
        "Did I coach/delegate vs. do?"
      }
      | ScoreArea::Energy => {
        "Did I feel strong and measured vs. \
         rushed?"
      }
    }
  }

  pub fn score_of(
    self,
    checkin: &WeeklyCheckin
  ) -> Option<Score> {
    match self {
      | ScoreArea::Body => checkin.score_body,
      | ScoreArea::Mind => checkin.score_mind,
      | ScoreArea::Work => checkin.score_work,
      | ScoreArea::Energy => {
        checkin.score_energy
      }
    }
  }
}

pub const EQUANIMITY_PROMPT: &str =
  "What felt equanimous this week?";
pub const FLAG_PROMPT: &str =
  "What am I doing that a more \
   equanimous me wouldn't?";

pub const TRENDS_PROMPT: &str =
  "Trends - what's the pattern?";
pub const KEYSTONE_PROMPT: &str =
  "Keystone - when did I feel physically \
   strong + emotionally measured? When \
   didn't I?";
pub const NEXT_WHY_PROMPT: &str =
  "Next Why - any emerging clarity on \
   what fires me up?";
pub const ADJUST_PROMPT: &str =
  "One small tweak for next month";

/// Editable state of the weekly form.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct WeeklyDraft {
  pub score_body:      Option<Score>,
  pub score_mind:      Option<Score>,
  pub score_work:      Option<Score>,
  pub score_energy:    Option<Score>,
  pub equanimity_note: String,
  pub flag_note:       String
}

impl WeeklyDraft {
  pub fn from_checkin(
    checkin: &WeeklyCheckin
  ) -> Self {
    Self {
      score_body:      checkin.score_body,
      score_mind:      checkin.score_mind,
      score_work:      checkin.score_work,
      score_energy:    checkin
        .score_energy,
      equanimity_note: checkin
        .equanimity_note
        .clone(),
      flag_note:       checkin
        .flag_note
        .clone()
    }
  }

  pub fn score(
    &self,
    area: ScoreArea
  ) -> Option<Score> {
    match area {
      | ScoreArea::Body => self.score_body,
      | ScoreArea::Mind => self.score_mind,
      | ScoreArea::Work => self.score_work,
      | ScoreArea::Energy => {
        self.score_energy
      }
    }
  }

  pub fn set_score(
    &mut self,
    area: ScoreArea,
    score: Option<Score>
  ) {
    let slot = match area {
      | ScoreArea::Body => {
        &mut self.score_body
      }
      | ScoreArea::Mind => {
        &mut self.score_mind
      }
      | ScoreArea::Work => {
        &mut self.score_work
      }
      | ScoreArea::Energy => {
        &mut self.score_energy
      }
    };
    *slot = score;
  }

  /// Applies a click on `clicked` for
  /// `area`.
  pub fn click_score(
    &mut self,
    area: ScoreArea,
    clicked: Score
  ) {
    let next = Score::toggle(
      self.score(area),
      clicked
    );
    self.set_score(area, next);
  }

  pub fn into_upsert(
    self,
    user_id: Uuid,
    week_of: NaiveDate
  ) -> WeeklyCheckinUpsert {
    WeeklyCheckinUpsert {
      user_id,
      week_of,
      score_body: self.score_body,
      score_mind: self.score_mind,
      score_work: self.score_work,
      score_energy: self.score_energy,
      equanimity_note: self
        .equanimity_note,
      flag_note: self.flag_note
    }
  }
}

/// Editable state of the monthly form.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
)]
pub struct MonthlyDraft {
  pub trends_note:   String,
  pub keystone_note: String,
  pub next_why_note: String,
  pub adjust_note:   String
}

impl MonthlyDraft {
  pub fn from_review(
    review: &MonthlyReview
  ) -> Self {
    Self {
      trends_note:   review
        .trends_note
        .clone(),
      keystone_note: review
        .keystone_note
        .clone(),
      next_why_note: review
        .next_why_note
        .clone(),
      adjust_note:   review
        .adjust_note
        .clone()
    }
  }

  pub fn into_upsert(
    self,
    user_id: Uuid,
    month_of: NaiveDate
  ) -> MonthlyReviewUpsert {
    MonthlyReviewUpsert {
      user_id,
      month_of,
      trends_note: self.trends_note,
      keystone_note: self.keystone_note,
      next_why_note: self.next_why_note,
      adjust_note: self.adjust_note
    }
  }
}

/// Which reflection is due on a given
/// day.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
)]
pub enum CheckinKind {
  Weekly,
  Monthly
}

impl CheckinKind {
  pub fn for_date(date: NaiveDate) -> Self {
    if is_last_friday_of_month(date) {
      CheckinKind::Monthly
    } else {
      CheckinKind::Weekly
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      | CheckinKind::Weekly => {
        "Weekly Check-In"
      }
      | CheckinKind::Monthly => {
        "Monthly Review"
      }
    }
  }

  pub fn blurb(self) -> &'static str {
    match self {
      | CheckinKind::Weekly => {
        "5 min gut check, no overthinking"
      }
      | CheckinKind::Monthly => {
        "15 min, last Friday of the month"
      }
    }
  }
}

/// Number of consecutive weekly entries,
/// counted from the newest. Entries must
/// be newest first; a neighbour counts
/// when it sits 6 to 8 days earlier.
pub fn streak(
  checkins: &[WeeklyCheckin]
) -> usize {
  if checkins.is_empty() {
    return 0;
  }
  1 + checkins
    .windows(2)
    .take_while(|pair| {
      let gap = (pair[0].week_of
        - pair[1].week_of)
        .num_days();
      (6..=8).contains(&gap)
    })
    .count()
}

/// Mean of the present scores, rounded
/// to one decimal.
pub fn average(
  scores: impl IntoIterator<Item = Option<Score>>
) -> Option<f64> {
  let values: Vec<f64> = scores
    .into_iter()
    .flatten()
    .map(|score| f64::from(score.value()))
    .collect();
  if values.is_empty() {
    return None;
  }
  let mean = values.iter().sum::<f64>()
    / values.len() as f64;
  Some((mean * 10.0).round() / 10.0)
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
)]
pub struct Averages {
  pub body:   Option<f64>,
  pub mind:   Option<f64>,
  pub work:   Option<f64>,
  pub energy: Option<f64>
}

impl Averages {
  pub fn of(
    checkins: &[WeeklyCheckin]
  ) -> Self {
    let by = |area: ScoreArea| {
      average(
        checkins
          .iter()
          .map(|checkin| {
            area.score_of(checkin)
          })
      )
    };
    Self {
      body:   by(ScoreArea::Body),
      mind:   by(ScoreArea::Mind),
      work:   by(ScoreArea::Work),
      energy: by(ScoreArea::Energy)
    }
  }

  pub fn get(
    &self,
    area: ScoreArea
  ) -> Option<f64> {
    match area {
      | ScoreArea::Body => self.body,
      | ScoreArea::Mind => self.mind,
      | ScoreArea::Work => self.work,
      | ScoreArea::Energy => self.energy
    }
  }
}

/// A dated note pulled out of a check-in.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
)]
pub struct DatedNote {
  pub week_of: NaiveDate,
  pub note:    String
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
)]
pub struct WeeklyMetrics {
  /// Newest first, as fetched.
  pub checkins: Vec<WeeklyCheckin>,
  pub streak:   usize,
  pub averages: Averages
}

impl WeeklyMetrics {
  pub fn from_checkins(
    checkins: Vec<WeeklyCheckin>
  ) -> Self {
    let streak = streak(&checkins);
    let averages = Averages::of(&checkins);
    Self {
      checkins,
      streak,
      averages
    }
  }

  /// Oldest to newest.
  pub fn timeline(
    &self
  ) -> impl Iterator<Item = &WeeklyCheckin>
  {
    self.checkins.iter().rev()
  }

  pub fn equanimity_notes(
    &self
  ) -> Vec<DatedNote> {
    self.notes(|checkin| {
      &checkin.equanimity_note
    })
  }

  pub fn flags(&self) -> Vec<DatedNote> {
    self.notes(|checkin| &checkin.flag_note)
  }

  fn notes(
    &self,
    pick: impl Fn(&WeeklyCheckin) -> &String
  ) -> Vec<DatedNote> {
    self
      .timeline()
      .filter_map(|checkin| {
        let note = pick(checkin).trim();
        (!note.is_empty()).then(|| {
          DatedNote {
            week_of: checkin.week_of,
            note:    note.to_string()
          }
        })
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    Duration
  };
  use pretty_assertions::assert_eq;

  use super::*;

  fn score(value: u8) -> Option<Score> {
    Score::new(value)
  }

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn checkin(
    week_of: NaiveDate,
    body: Option<Score>,
    flag: &str
  ) -> WeeklyCheckin {
    WeeklyCheckin {
      id: Uuid::new_v4(),
      week_of,
      score_body: body,
      score_mind: None,
      score_work: score(3),
      score_energy: None,
      equanimity_note: String::new(),
      flag_note: flag.to_string(),
      created_at: DateTime::default()
    }
  }

  #[test]
  fn scores_are_bounded() {
    assert_eq!(Score::new(0), None);
    assert_eq!(Score::new(6), None);
    assert_eq!(
      Score::all()
        .map(Score::value)
        .collect::<Vec<_>>(),
      vec![1, 2, 3, 4, 5]
    );
    assert!(
      serde_json::from_str::<Score>("9")
        .is_err()
    );
  }

  #[test]
  fn clicking_selected_score_clears_it() {
    let four = Score::new(4)
      .expect("valid score");
    let two =
      Score::new(2).expect("valid score");
    assert_eq!(
      Score::toggle(Some(four), four),
      None
    );
    assert_eq!(
      Score::toggle(Some(four), two),
      Some(two)
    );

    let mut draft = WeeklyDraft::default();
    draft.click_score(ScoreArea::Mind, two);
    assert_eq!(draft.score_mind, Some(two));
    draft.click_score(ScoreArea::Mind, two);
    assert_eq!(draft.score_mind, None);
  }

  #[test]
  fn tones() {
    assert_eq!(
      ScoreTone::of(4.0),
      ScoreTone::Strong
    );
    assert_eq!(
      ScoreTone::of(3.5),
      ScoreTone::Steady
    );
    assert_eq!(
      ScoreTone::of(2.9),
      ScoreTone::Low
    );
  }

  #[test]
  fn streak_stops_at_first_gap() {
    let newest = date(2026, 3, 2);
    let checkins = vec![
      checkin(newest, None, ""),
      checkin(
        newest - Duration::days(7),
        None,
        ""
      ),
      checkin(
        newest - Duration::days(15),
        None,
        ""
      ),
      checkin(
        newest - Duration::days(28),
        None,
        ""
      ),
    ];
    assert_eq!(streak(&checkins), 3);
    assert_eq!(streak(&checkins[3..]), 1);
    assert_eq!(streak(&[]), 0);

    let broken = vec![
      checkin(newest, None, ""),
      checkin(
        newest - Duration::days(14),
        None,
        ""
      ),
    ];
    assert_eq!(streak(&broken), 1);
  }

  #[test]
  fn averages_skip_missing_scores() {
    assert_eq!(
      average([score(4), None, score(5)]),
      Some(4.5)
    );
    assert_eq!(
      average([score(4), score(4), score(5)]),
      Some(4.3)
    );
    assert_eq!(average([None, None]), None);
  }

  #[test]
  fn metrics_from_newest_first() {
    let checkins = vec![
      checkin(
        date(2026, 3, 2),
        score(5),
        "rushing"
      ),
      checkin(date(2026, 2, 23), None, ""),
      checkin(
        date(2026, 2, 16),
        score(2),
        " taking over "
      ),
    ];

    let metrics =
      WeeklyMetrics::from_checkins(checkins);
    assert_eq!(metrics.streak, 3);
    assert_eq!(
      metrics.averages,
      Averages {
        body:   Some(3.5),
        mind:   None,
        work:   Some(3.0),
        energy: None
      }
    );
    assert_eq!(
      metrics
        .timeline()
        .map(|checkin| checkin.week_of)
        .collect::<Vec<_>>(),
      vec![
        date(2026, 2, 16),
        date(2026, 2, 23),
        date(2026, 3, 2),
      ]
    );
    assert_eq!(
      metrics.flags(),
      vec![
        DatedNote {
          week_of: date(2026, 2, 16),
          note:    "taking over".to_string()
        },
        DatedNote {
          week_of: date(2026, 3, 2),
          note:    "rushing".to_string()
        },
      ]
    );
    assert!(
      metrics.equanimity_notes().is_empty()
    );
  }

  #[test]
  fn checkin_kind_follows_last_friday() {
    assert_eq!(
      CheckinKind::for_date(date(
        2026, 2, 27
      )),
      CheckinKind::Monthly
    );
    assert_eq!(
      CheckinKind::for_date(date(
        2026, 2, 20
      )),
      CheckinKind::Weekly
    );
  }

  #[test]
  fn draft_round_trips_existing_checkin() {
    let existing = checkin(
      date(2026, 2, 23),
      score(4),
      "flag"
    );
    let draft =
      WeeklyDraft::from_checkin(&existing);
    let user = Uuid::from_u128(1);
    let upsert = draft
      .into_upsert(user, existing.week_of);
    assert_eq!(upsert.user_id, user);
    assert_eq!(upsert.score_body, score(4));
    assert_eq!(upsert.flag_note, "flag");
  }
}
