//! Radix-tree request router.
//!
//! One tree per HTTP method. Each matched route carries its middleware
//! directives; parameters are bound before the chain starts.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::binding::{Binder, Bound};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{self, DynMiddleware, Expires, Middleware, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A route definition: method, path, handler, and the middleware it runs through.
///
/// ```rust
/// use expire_route::{Method, Request, Route};
/// use expire_route::middleware::Expires;
///
/// async fn show(_req: Request) -> &'static str { "ok" }
///
/// Route::new(Method::Get, "/user/{user}/number/{number}", show)
///     .middleware("expires:user")
///     .middleware(Expires::by("user.trial_ends_at"));
/// ```
pub struct Route {
    method: Method,
    path: String,
    endpoint: Endpoint,
}

struct Endpoint {
    handler: BoxedHandler,
    middleware: Vec<String>,
}

impl Route {
    pub fn new(method: Method, path: &str, handler: impl Handler) -> Self {
        Self {
            method,
            path: path.to_owned(),
            endpoint: Endpoint { handler: Arc::new(handler), middleware: Vec::new() },
        }
    }

    /// Appends a middleware directive, `name[:arg1,arg2,...]`.
    pub fn middleware(mut self, directive: impl Into<String>) -> Self {
        self.endpoint.middleware.push(directive.into());
        self
    }
}

/// The application router.
///
/// Build it once at startup. [`Router::new`] comes with the
/// [`expires`](crate::middleware::Expires) alias registered.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<Endpoint>>>,
    aliases: HashMap<String, DynMiddleware>,
    binders: HashMap<String, Binder>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), aliases: HashMap::new(), binders: HashMap::new() }
            .alias_middleware(middleware::SIGNATURE, Expires::new())
    }

    /// Register a handler for a method + path pair with no middleware.
    ///
    /// Path parameters use `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(Route::new(method, path, handler))
    }

    /// Register a [`Route`].
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    pub fn route(mut self, route: Route) -> Self {
        let Route { method, path, endpoint } = route;
        self.routes
            .entry(method)
            .or_default()
            .insert(path.as_str(), Arc::new(endpoint))
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Makes `middleware` available to routes as `name`. Replaces any
    /// middleware already registered under that name.
    pub fn alias_middleware(mut self, name: &str, middleware: impl Middleware) -> Self {
        self.aliases.insert(name.to_owned(), Arc::new(middleware));
        self
    }

    /// Resolves parameter `name` through `resolver` on every route. A `None`
    /// answers the request with `404`.
    ///
    /// Parameters without a binder are bound to their raw path segment.
    pub fn bind<F>(mut self, name: &str, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<Bound> + Send + Sync + 'static,
    {
        self.binders.insert(name.to_owned(), Arc::new(resolver));
        self
    }

    /// Routes one request through its middleware chain and handler.
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_owned();

        let Ok(method) = Method::try_from(&parts.method) else {
            return Response::status(StatusCode::METHOD_NOT_ALLOWED);
        };
        let Some((endpoint, params)) = self.lookup(method, &path) else {
            debug!(%method, %path, "no route matched");
            return Response::status(StatusCode::NOT_FOUND);
        };

        let mut bindings = HashMap::with_capacity(params.len());
        for (name, segment) in &params {
            let bound = match self.binders.get(name) {
                Some(resolver) => match resolver(segment.as_str()) {
                    Some(bound) => bound,
                    None => return Error::NotFound.into_response(),
                },
                None => Bound::from(segment.as_str()),
            };
            bindings.insert(name.clone(), bound);
        }

        let stack = match self.middleware_stack(&endpoint.middleware) {
            Ok(stack) => stack,
            Err(e) => return e.into_response(),
        };

        debug!(%method, %path, middleware = stack.len(), "dispatching");
        let req = Request::new(method, path, parts.headers, body, params, bindings);
        Next::new(stack, Arc::clone(&endpoint.handler)).run(req).await
    }

    fn middleware_stack(&self, directives: &[String]) -> Result<VecDeque<(DynMiddleware, Vec<String>)>, Error> {
        directives
            .iter()
            .map(|directive| {
                let (name, args) = middleware::parse_directive(directive);
                let middleware = self
                    .aliases
                    .get(name)
                    .ok_or_else(|| Error::UnknownMiddleware(name.to_owned()))?;
                Ok((Arc::clone(middleware), args))
            })
            .collect()
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Arc<Endpoint>, Vec<(String, String)>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((Arc::clone(matched.value), params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
