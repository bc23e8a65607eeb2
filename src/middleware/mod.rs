//! Middleware layer.
//!
//! A route lists middleware as directives, `name[:arg1,arg2,...]`. At dispatch
//! the router resolves each name through its alias table and runs the chain in
//! declaration order, ending in the route handler:
//!
//! ```rust,no_run
//! use expire_route::{Method, Request, Route, Router};
//! use expire_route::middleware::Expires;
//!
//! async fn show(_req: Request) -> &'static str { "ok" }
//!
//! let app = Router::new()
//!     .route(Route::new(Method::Get, "/invites/{invite}", show).middleware("expires"))
//!     .route(
//!         Route::new(Method::Get, "/posts/{post}", show)
//!             .middleware(Expires::by("post.published_at").after("1 day")),
//!     );
//! ```
//!
//! Closures `Fn(Request, Next) -> impl Future` are middleware too; they never
//! see directive arguments.

mod declaration;
mod expires;

pub use declaration::{Declaration, Unit};
pub use expires::{EXPIRATION_ATTRIBUTE, Expires, SIGNATURE};

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::IntoResponse;

/// Request interceptor.
pub trait Middleware: Send + Sync + 'static {
    /// Handles `req`, either answering directly or passing it on with `next.run(req)`.
    fn handle(&self, req: Request, args: &[String], next: Next) -> BoxFuture;
}

pub(crate) type DynMiddleware = Arc<dyn Middleware>;

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn handle(&self, req: Request, _args: &[String], next: Next) -> BoxFuture {
        let fut = self(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// The rest of the chain.
pub struct Next {
    stack: VecDeque<(DynMiddleware, Vec<String>)>,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: VecDeque<(DynMiddleware, Vec<String>)>, endpoint: BoxedHandler) -> Self {
        Self { stack, endpoint }
    }

    /// Runs the next middleware, or the route handler once the stack is empty.
    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.pop_front() {
            Some((middleware, args)) => middleware.handle(req, &args, self),
            None => self.endpoint.call(req),
        }
    }
}

/// Splits `name:arg1,arg2` into the alias and its arguments.
pub(crate) fn parse_directive(directive: &str) -> (&str, Vec<String>) {
    match directive.split_once(':') {
        Some((name, args)) => (name, args.split(',').map(str::to_owned).collect()),
        None => (directive, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_directive_splits_name_and_arguments() {
        assert_eq!(parse_directive("expires"), ("expires", vec![]));
        assert_eq!(parse_directive("expires:user"), ("expires", vec!["user".to_owned()]));
        assert_eq!(
            parse_directive("expires:user.ends_at,1 day"),
            ("expires", vec!["user.ends_at".to_owned(), "1 day".to_owned()]),
        );
    }

    #[test]
    fn only_the_first_colon_separates_the_name() {
        assert_eq!(
            parse_directive("expires:post,2024-01-01 10:00"),
            ("expires", vec!["post".to_owned(), "2024-01-01 10:00".to_owned()]),
        );
    }
}
