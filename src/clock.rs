//! Current time and timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde_json::Value;

use crate::error::Error;

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant. Handy in tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an attribute value into an instant.
///
/// Missing and `null` values mean `now`. Strings may be `now`, `today`,
/// `yesterday`, `tomorrow`, RFC 3339, `YYYY-MM-DD[ HH:MM[:SS[.f]]]` (read as
/// UTC) or `@<unix seconds>`. Numbers are unix seconds.
pub fn parse_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
    match value {
        None | Some(Value::Null) => Ok(now),
        Some(Value::String(s)) => parse_str(s.trim(), now),
        Some(Value::Number(n)) => {
            let parsed = match n.as_i64() {
                Some(secs) => DateTime::from_timestamp(secs, 0),
                None => n.as_f64().and_then(from_fractional_secs),
            };
            parsed.ok_or_else(|| Error::InvalidTimestamp(n.to_string()))
        }
        Some(other) => Err(Error::InvalidTimestamp(other.to_string())),
    }
}

fn parse_str(s: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
    let midnight = |date: NaiveDate| date.and_time(NaiveTime::MIN).and_utc();

    match s.to_ascii_lowercase().as_str() {
        "now" => return Ok(now),
        "today" => return Ok(midnight(now.date_naive())),
        "yesterday" => return Ok(midnight(now.date_naive()) - TimeDelta::days(1)),
        "tomorrow" => return Ok(midnight(now.date_naive()) + TimeDelta::days(1)),
        _ => {}
    }

    if let Some(secs) = s.strip_prefix('@') {
        return secs
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(midnight))
        .ok_or_else(|| Error::InvalidTimestamp(s.to_owned()))
}

fn from_fractional_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
