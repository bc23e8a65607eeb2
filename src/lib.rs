//! # expire-route
//!
//! Route expiration for HTTP services. Put the `expires` middleware on a
//! route and requests answer `404 Not Found` once the resource bound to the
//! route has expired, instead of serving something stale.
//!
//! ## What "expired" means
//!
//! The middleware reads a timestamp off the value bound to a route parameter
//! and compares it with the current time:
//!
//! - `expires`: the `expired_at` attribute of the route's last parameter
//! - `expires:invite.valid_until`: a named parameter and attribute
//! - `expires:post,60` / `expires:post,1 day`: the record's creation time
//!   plus an offset
//!
//! Directives can be written by hand or built with
//! [`Expires::by`](middleware::Expires::by).
//!
//! ## Quick start
//!
//! ```rust
//! use expire_route::{Bound, Entity, Method, Request, Route, Router};
//! use expire_route::middleware::Expires;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), expire_route::Error> {
//! let app = Router::new()
//!     .bind("invite", |id| {
//!         let invite = json!({ "id": id, "expired_at": "2030-01-01T00:00:00Z" });
//!         Some(Bound::entity(Entity::new("Invite", id), invite))
//!     })
//!     .route(Route::new(Method::Get, "/invites/{invite}", show).middleware("expires"))
//!     .route(
//!         Route::new(Method::Get, "/invites/{invite}/preview", show)
//!             .middleware(Expires::by("invite").r#in(2)?.hours()),
//!     );
//! # let _ = app;
//! # Ok(())
//! # }
//!
//! async fn show(req: Request) -> String {
//!     format!("invite {}", req.param("invite").unwrap_or_default())
//! }
//! ```
//!
//! The transport is up to you: hand [`Router::dispatch`] an
//! `http::Request<Bytes>` and send back [`Response::into_http`].

mod binding;
mod clock;
mod error;
mod handler;
mod interval;
mod method;
mod request;
mod response;
mod router;

pub mod middleware;

pub use binding::{Binder, Bound, CREATED_AT, Entity};
pub use clock::{Clock, FixedClock, SystemClock, parse_timestamp};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use interval::Interval;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{Route, Router};
