//! Route handlers.
//!
//! A handler is the last link of a route's middleware chain. Any
//! `async fn(Request) -> impl IntoResponse` qualifies; routes keep it as an
//! `Arc<dyn Handler>` so one tree can hold handlers of every concrete type.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A boxed, `Send` future resolving to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Produces the response for a matched route.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

pub(crate) type BoxedHandler = Arc<dyn Handler>;

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
