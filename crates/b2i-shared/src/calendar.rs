//! Week and month boundaries.

use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

/// Monday of the week containing `date`.
/// Sunday closes the week that began six
/// days earlier.
pub fn week_monday(
  date: NaiveDate
) -> NaiveDate {
  let offset = date
    .weekday()
    .num_days_from_monday();
  date - Duration::days(i64::from(offset))
}

/// First day of the month containing
/// `date`.
pub fn month_of(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

pub fn is_last_friday_of_month(
  date: NaiveDate
) -> bool {
  if date.weekday() != Weekday::Fri {
    return false;
  }
  let next = date + Duration::days(7);
  next.month() != date.month()
}

/// Short label for a week, e.g. `Feb 23`.
pub fn week_label(
  week_of: NaiveDate
) -> String {
  week_of.format("%b %-d").to_string()
}

/// Label for a month, e.g. `February 2026`.
pub fn month_label(
  month_of: NaiveDate
) -> String {
  month_of.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn week_starts_on_monday() {
    assert_eq!(
      week_monday(date(2026, 2, 23)),
      date(2026, 2, 23)
    );
    assert_eq!(
      week_monday(date(2026, 2, 27)),
      date(2026, 2, 23)
    );
    assert_eq!(
      week_monday(date(2026, 3, 1)),
      date(2026, 2, 23)
    );
    assert_eq!(
      week_monday(date(2026, 1, 1)),
      date(2025, 12, 29)
    );
  }

  #[test]
  fn month_of_is_first_day() {
    assert_eq!(
      month_of(date(2026, 2, 27)),
      date(2026, 2, 1)
    );
  }

  #[test]
  fn last_friday_detection() {
    assert!(is_last_friday_of_month(date(
      2026, 2, 27
    )));
    assert!(!is_last_friday_of_month(
      date(2026, 2, 20)
    ));
    assert!(!is_last_friday_of_month(
      date(2026, 2, 28)
    ));
    assert!(is_last_friday_of_month(date(
      2026, 7, 31
    )));
  }

  #[test]
  fn labels() {
    assert_eq!(
      week_label(date(2026, 3, 2)),
      "Mar 2"
    );
    assert_eq!(
      month_label(date(2026, 2, 1)),
      "February 2026"
    );
  }
}
