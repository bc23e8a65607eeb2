//! Duration expressions added to a base timestamp.
//!
//! Two notations are understood:
//!
//! - prose: `"1 day"`, `"2 hours 30 minutes"`, `"1 week and 2 days"`,
//!   `"an hour"`, `"90min"`
//! - ISO 8601: `"P1D"`, `"PT1H30M"`, `"P1Y2M"`
//!
//! Months and years are applied on the calendar (`Jan 31 + 1 month` lands on
//! the last day of February), everything else is a fixed span.

use chrono::{DateTime, Months, TimeDelta, Utc};

use crate::error::Error;

/// A span of calendar months plus a fixed duration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval {
    months: i64,
    delta: TimeDelta,
}

impl Default for Interval {
    fn default() -> Self {
        Self { months: 0, delta: TimeDelta::zero() }
    }
}

impl Interval {
    /// A fixed span of `minutes`. Fails past chrono's `TimeDelta` range.
    pub fn minutes(minutes: i64) -> Result<Self, Error> {
        TimeDelta::try_minutes(minutes)
            .map(|delta| Self { months: 0, delta })
            .ok_or_else(|| Error::InvalidInterval(format!("{minutes} minutes")))
    }

    pub fn parse(expr: &str) -> Result<Self, Error> {
        let trimmed = expr.trim();
        let parsed = match trimmed.strip_prefix(['P', 'p']) {
            Some(rest) => parse_iso(rest),
            None => parse_prose(trimmed),
        };
        parsed.ok_or_else(|| Error::InvalidInterval(expr.to_owned()))
    }

    /// Adds the interval to `ts`. Fails only when the result leaves chrono's range.
    pub fn add_to(&self, ts: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
        let overflow = || Error::InvalidInterval(format!("{self:?} from {ts}"));

        let shifted = match u32::try_from(self.months.unsigned_abs()) {
            Ok(0) => Some(ts),
            Ok(n) if self.months > 0 => ts.checked_add_months(Months::new(n)),
            Ok(n) => ts.checked_sub_months(Months::new(n)),
            Err(_) => None,
        };
        shifted.and_then(|ts| ts.checked_add_signed(self.delta)).ok_or_else(overflow)
    }

    fn add(&mut self, amount: i64, unit: Unit) -> Option<()> {
        match unit {
            Unit::Month => self.months = self.months.checked_add(amount)?,
            Unit::Year => self.months = self.months.checked_add(amount.checked_mul(12)?)?,
            Unit::Fixed(secs) => {
                let span = TimeDelta::try_seconds(amount.checked_mul(secs)?)?;
                self.delta = self.delta.checked_add(&span)?;
            }
        }
        Some(())
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Fixed(i64),
    Month,
    Year,
}

fn unit(name: &str) -> Option<Unit> {
    let unit = match name.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Unit::Fixed(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Unit::Fixed(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Unit::Fixed(3_600),
        "d" | "day" | "days" => Unit::Fixed(86_400),
        "w" | "week" | "weeks" => Unit::Fixed(604_800),
        "mo" | "mon" | "month" | "months" => Unit::Month,
        "y" | "yr" | "yrs" | "year" | "years" => Unit::Year,
        _ => return None,
    };
    Some(unit)
}

/// `<n> <unit>` terms, separated by whitespace, commas or `and`.
fn parse_prose(expr: &str) -> Option<Interval> {
    let mut interval = Interval::default();
    let mut pending: Option<i64> = None;
    let mut terms = 0;

    for word in expr.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty()) {
        if word.eq_ignore_ascii_case("and") && pending.is_none() {
            continue;
        }

        let split = word
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
            .map_or(word.len(), |(i, _)| i);
        let (number, name) = word.split_at(split);

        match (number, pending.take()) {
            ("", None) if matches!(name.to_ascii_lowercase().as_str(), "a" | "an") => pending = Some(1),
            ("", Some(amount)) => {
                interval.add(amount, unit(name)?)?;
                terms += 1;
            }
            (number, None) if name.is_empty() => pending = Some(number.parse().ok()?),
            // "90min"
            (number, None) if !number.is_empty() => {
                interval.add(number.parse().ok()?, unit(name)?)?;
                terms += 1;
            }
            _ => return None,
        }
    }

    (terms > 0 && pending.is_none()).then_some(interval)
}

/// The part of an ISO 8601 duration after the leading `P`.
fn parse_iso(rest: &str) -> Option<Interval> {
    let mut interval = Interval::default();
    let mut in_time = false;
    let mut digits = String::new();
    let mut terms = 0;

    for c in rest.chars() {
        match c.to_ascii_uppercase() {
            'T' if !in_time && digits.is_empty() => in_time = true,
            d if d.is_ascii_digit() => digits.push(d),
            designator => {
                let amount: i64 = digits.parse().ok()?;
                digits.clear();
                let unit = match (designator, in_time) {
                    ('Y', false) => Unit::Year,
                    ('M', false) => Unit::Month,
                    ('W', false) => Unit::Fixed(604_800),
                    ('D', false) => Unit::Fixed(86_400),
                    ('H', true) => Unit::Fixed(3_600),
                    ('M', true) => Unit::Fixed(60),
                    ('S', true) => Unit::Fixed(1),
                    _ => return None,
                };
                interval.add(amount, unit)?;
                terms += 1;
            }
        }
    }

    (terms > 0 && digits.is_empty()).then_some(interval)
}
