use anyhow::anyhow;
use chrono::{
  DateTime,
  Duration,
  Local,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;

use crate::config::Config;

/// Resolves "today" in the configured
/// zone (`time.zone`), or the machine's
/// local zone when none is set.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
  tz: Option<Tz>
}

impl Clock {
  pub fn from_config(cfg: &Config) -> Self {
    let tz = cfg.get("time.zone").and_then(
      |raw| parse_timezone(&raw, "time.zone")
    );
    Self { tz }
  }

  pub fn with_zone(tz: Tz) -> Self {
    Self { tz: Some(tz) }
  }

  pub fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }

  pub fn today(&self) -> NaiveDate {
    self.date_of(self.now())
  }

  #[must_use]
  pub fn date_of(
    &self,
    at: DateTime<Utc>
  ) -> NaiveDate {
    match self.tz {
      | Some(tz) => {
        at.with_timezone(&tz).date_naive()
      }
      | None => {
        at.with_timezone(&Local)
          .date_naive()
      }
    }
  }

  /// Parses `YYYY-MM-DD`, `today`,
  /// `tomorrow`, `yesterday` or a day
  /// offset such as `+3d` / `-1w`.
  pub fn parse_date(
    &self,
    raw: &str
  ) -> anyhow::Result<NaiveDate> {
    let token = raw.trim().to_ascii_lowercase();
    let today = self.today();
    match token.as_str() {
      | "today" => return Ok(today),
      | "tomorrow" => {
        return Ok(today + Duration::days(1));
      }
      | "yesterday" => {
        return Ok(today - Duration::days(1));
      }
      | _ => {}
    }

    if let Ok(date) =
      NaiveDate::parse_from_str(&token, "%Y-%m-%d")
    {
      return Ok(date);
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = rel_re.captures(&token)
    {
      let num: i64 = caps
        .name("num")
        .map(|m| m.as_str())
        .unwrap_or("0")
        .parse()
        .map_err(|_| {
          anyhow!("invalid day offset: {raw}")
        })?;
      let days = match caps
        .name("unit")
        .map(|m| m.as_str())
      {
        | Some("w") => num * 7,
        | _ => num
      };
      let signed = if caps
        .name("sign")
        .is_some_and(|m| m.as_str() == "-")
      {
        -days
      } else {
        days
      };
      return Ok(today + Duration::days(signed));
    }

    Err(anyhow!(
      "invalid date {raw:?}; expected \
       YYYY-MM-DD, today, tomorrow, \
       yesterday or +Nd"
    ))
  }
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id; \
         using local time"
      );
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn today_follows_configured_zone() {
    let mut cfg = Config::default();
    cfg.set("time.zone", "Pacific/Auckland");
    let clock = Clock::from_config(&cfg);

    let late_utc = Utc
      .with_ymd_and_hms(2026, 2, 27, 20, 0, 0)
      .single()
      .expect("valid timestamp");
    assert_eq!(
      clock.date_of(late_utc),
      NaiveDate::from_ymd_opt(2026, 2, 28)
        .expect("valid date")
    );
  }

  #[test]
  fn bad_zone_falls_back_to_local() {
    let mut cfg = Config::default();
    cfg.set("time.zone", "Mars/Olympus");
    let clock = Clock::from_config(&cfg);
    assert!(clock.tz.is_none());
  }

  #[test]
  fn parses_dates_and_offsets() {
    let clock = Clock::with_zone(chrono_tz::UTC);
    let today = clock.today();
    assert_eq!(
      clock.parse_date("2026-03-02").expect("date"),
      NaiveDate::from_ymd_opt(2026, 3, 2)
        .expect("valid date")
    );
    assert_eq!(
      clock.parse_date("+2d").expect("offset"),
      today + Duration::days(2)
    );
    assert_eq!(
      clock.parse_date("-1w").expect("offset"),
      today - Duration::days(7)
    );
    assert_eq!(
      clock.parse_date("Tomorrow").expect("word"),
      today + Duration::days(1)
    );
    assert!(clock.parse_date("someday").is_err());
  }
}
