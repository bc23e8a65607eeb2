//! The `expires` middleware.
//!
//! Answers `404 Not Found` once the value bound to a route parameter has
//! expired. The directive arguments pick what to compare:
//!
//! | Directive | Compared against |
//! |---|---|
//! | `expires` | `expired_at` of the last route parameter |
//! | `expires:post` | `expired_at` of `post` |
//! | `expires:post.ends_at` | `ends_at` of `post` |
//! | `expires:post,60` | creation time of `post` + 60 minutes |
//! | `expires:post,1 day` | creation time of `post` + 1 day |
//! | `expires:post.sent_at,1 day` | `sent_at` of `post` + 1 day |
//!
//! A missing attribute counts as "now", so it never expires on its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::binding::Bound;
use crate::clock::{Clock, SystemClock, parse_timestamp};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::interval::Interval;
use crate::middleware::{Declaration, Middleware, Next};
use crate::request::Request;
use crate::response::IntoResponse;

/// Alias the middleware is registered under.
pub const SIGNATURE: &str = "expires";

/// Attribute read when the directive names none and has no relative offset.
pub const EXPIRATION_ATTRIBUTE: &str = "expired_at";

/// Rejects requests whose bound resource has expired.
#[derive(Clone)]
pub struct Expires {
    clock: Arc<dyn Clock>,
    default_attribute: String,
}

impl Expires {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock) -> Self {
        Self { clock: Arc::new(clock), default_attribute: EXPIRATION_ATTRIBUTE.to_owned() }
    }

    /// Attribute read in direct mode instead of `expired_at`.
    pub fn default_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.default_attribute = attribute.into();
        self
    }

    /// Starts a directive for `parameter` (`"post"` or `"post.ends_at"`).
    pub fn by(parameter: &str) -> Declaration {
        Declaration::new(parameter)
    }

    /// Decides whether `req` may pass.
    ///
    /// `parameter` is `name[.attribute]`; without it the route's last
    /// parameter is used, and an empty one is an error. `relative` is a
    /// minute count or an interval expression added to the timestamp before
    /// comparing. Any `relative`, even an empty one, switches the default
    /// attribute to the creation column.
    pub fn check(&self, req: &Request, parameter: Option<&str>, relative: Option<&str>) -> Result<(), Error> {
        let parameter = parameter
            .or_else(|| req.param_names().next_back())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::MissingParameter { path: req.route_path().to_owned() })?;

        let (parameter, attribute) = match parameter.split_once('.') {
            Some((parameter, attribute)) => (parameter, Some(attribute)),
            None => (parameter, None),
        };

        let empty = Bound::value(Value::Null);
        let target = req.route(parameter).unwrap_or(&empty);

        let attribute = match (attribute.filter(|a| !a.is_empty()), relative) {
            (Some(attribute), _) => attribute,
            (None, None) => self.default_attribute.as_str(),
            (None, Some(_)) => target.created_at_column(),
        };

        let now = self.clock.now();
        let expires_at = expiration(target.get(attribute), relative, now)?;

        debug!(parameter, attribute, relative, %expires_at, %now, "checking route expiration");

        if now > expires_at {
            info!(path = req.path(), parameter, %expires_at, "route expired");
            return Err(target.not_found());
        }

        Ok(())
    }
}

impl Default for Expires {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Expires {
    fn handle(&self, req: Request, args: &[String], next: Next) -> BoxFuture {
        let parameter = args.first().map(String::as_str);
        let relative = args.get(1).map(String::as_str);

        match self.check(&req, parameter, relative) {
            Ok(()) => next.run(req),
            Err(e) => Box::pin(async move { e.into_response() }),
        }
    }
}

/// The instant the attribute `value` expires, once `relative` is added.
fn expiration(value: Option<&Value>, relative: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
    let timestamp = parse_timestamp(value, now)?;

    let relative = match relative.map(str::trim) {
        None | Some("") => return Ok(timestamp),
        Some(relative) => relative,
    };

    let interval = match relative.parse::<i64>() {
        Ok(minutes) => Interval::minutes(minutes)?,
        Err(_) => match relative.parse::<f64>() {
            Ok(minutes) if minutes.is_finite() => Interval::minutes(minutes.trunc() as i64)?,
            _ => Interval::parse(relative)?,
        },
    };
    interval.add_to(timestamp)
}
