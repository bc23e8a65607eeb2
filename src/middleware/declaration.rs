//! Fluent construction of `expires` directives.
//!
//! ```rust
//! use expire_route::middleware::Expires;
//!
//! # fn main() -> Result<(), expire_route::Error> {
//! assert_eq!(Expires::by("invite").to_string(), "expires:invite");
//! assert_eq!(Expires::by("post.published_at").after("1 day").to_string(), "expires:post.published_at,1 day");
//! assert_eq!(Expires::by("post").r#in(2)?.hours().and(30)?.minutes().to_string(), "expires:post,150");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

use crate::error::Error;
use crate::middleware::expires::SIGNATURE;

/// Units accepted by [`Declaration::unit`].
///
/// Months are 30 days and years 365 days; directive offsets are plain minute
/// counts, not calendar arithmetic.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    pub fn seconds(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour   => 3_600,
            Self::Day    => 86_400,
            Self::Week   => 604_800,
            Self::Month  => 2_592_000,
            Self::Year   => 31_536_000,
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second" | "seconds" => Ok(Self::Second),
            "minute" | "minutes" => Ok(Self::Minute),
            "hour" | "hours"     => Ok(Self::Hour),
            "day" | "days"       => Ok(Self::Day),
            "week" | "weeks"     => Ok(Self::Week),
            "month" | "months"   => Ok(Self::Month),
            "year" | "years"     => Ok(Self::Year),
            _ => Err(Error::UndefinedMethod { class: "Declaration", method: s.to_owned() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Relative {
    Literal(String),
    Accumulated(TimeDelta),
}

/// Builder for an `expires:<parameter>[.<attribute>][,<relative>]` directive.
///
/// Obtain one with [`Expires::by`](crate::middleware::Expires::by). Every call
/// consumes the declaration and hands it back; render it with `to_string()`
/// or pass it straight to [`Route::middleware`](crate::Route::middleware).
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct Declaration {
    parameter: String,
    attribute: String,
    relative: Option<Relative>,
    amount: i64,
}

impl Declaration {
    /// `"post"` targets parameter `post`; `"post.published_at"` also sets the attribute.
    pub fn new(parameter: &str) -> Self {
        let (parameter, attribute) = parameter.split_once('.').unwrap_or((parameter, ""));
        Self {
            parameter: parameter.to_owned(),
            attribute: attribute.to_owned(),
            relative: None,
            amount: 1,
        }
    }

    /// The attribute holding the timestamp to compare.
    pub fn attribute(mut self, attribute: &str) -> Self {
        self.attribute = attribute.to_owned();
        self
    }

    /// Expire `interval` after the timestamp (`"1 day"`, `"PT30M"`). Replaces
    /// any offset built from units.
    pub fn after(mut self, interval: &str) -> Self {
        self.relative = Some(Relative::Literal(interval.to_owned()));
        self
    }

    /// Multiplier for the next unit call.
    pub fn r#in(mut self, amount: i64) -> Result<Self, Error> {
        if amount < 1 {
            return Err(Error::InvalidAmount(amount));
        }
        self.amount = amount;
        Ok(self)
    }

    /// Same as [`r#in`](Self::r#in); reads better between units.
    pub fn and(self, amount: i64) -> Result<Self, Error> {
        self.r#in(amount)
    }

    /// Adds the pending amount of `name` (`"hours"`, `"day"`, ...) to the offset.
    pub fn unit(self, name: &str) -> Result<Self, Error> {
        Ok(self.add(name.parse()?))
    }

    /// Adds the pending amount of `unit` to the offset and resets the amount to 1.
    pub fn add(mut self, unit: Unit) -> Self {
        let span = TimeDelta::try_seconds(self.amount.saturating_mul(unit.seconds()))
            .unwrap_or(TimeDelta::MAX);
        let total = match self.relative.take() {
            Some(Relative::Accumulated(total)) => total.checked_add(&span).unwrap_or(TimeDelta::MAX),
            _ => span,
        };
        self.relative = Some(Relative::Accumulated(total));
        self.amount = 1;
        self
    }

    pub fn second(self) -> Self { self.add(Unit::Second) }
    pub fn seconds(self) -> Self { self.add(Unit::Second) }
    pub fn minute(self) -> Self { self.add(Unit::Minute) }
    pub fn minutes(self) -> Self { self.add(Unit::Minute) }
    pub fn hour(self) -> Self { self.add(Unit::Hour) }
    pub fn hours(self) -> Self { self.add(Unit::Hour) }
    pub fn day(self) -> Self { self.add(Unit::Day) }
    pub fn days(self) -> Self { self.add(Unit::Day) }
    pub fn week(self) -> Self { self.add(Unit::Week) }
    pub fn weeks(self) -> Self { self.add(Unit::Week) }
    pub fn month(self) -> Self { self.add(Unit::Month) }
    pub fn months(self) -> Self { self.add(Unit::Month) }
    pub fn year(self) -> Self { self.add(Unit::Year) }
    pub fn years(self) -> Self { self.add(Unit::Year) }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.attribute.is_empty() {
            self.parameter.clone()
        } else {
            format!("{}.{}", self.parameter, self.attribute)
        };
        let relative = match &self.relative {
            None => String::new(),
            Some(Relative::Literal(interval)) => interval.clone(),
            Some(Relative::Accumulated(total)) => match total.num_minutes() {
                0 => String::new(),
                minutes => minutes.to_string(),
            },
        };

        let args = [field, relative].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>();
        write!(f, "{SIGNATURE}:{}", args.join(","))
    }
}

impl From<Declaration> for String {
    fn from(declaration: Declaration) -> Self {
        declaration.to_string()
    }
}
