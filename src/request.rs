//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;

use crate::binding::Bound;
use crate::method::Method;

/// An incoming request, matched to a route and with its parameters bound.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) bindings: HashMap<String, Bound>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: HeaderMap,
        body: Bytes,
        params: Vec<(String, String)>,
        bindings: HashMap<String, Bound>,
    ) -> Self {
        Self { method, path, headers, body, params, bindings }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The path without surrounding slashes, or `/` for the root.
    pub fn route_path(&self) -> &str {
        match self.path.trim_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    /// Header lookup; `None` for absent or non-UTF-8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw path segment for a named parameter.
    ///
    /// For a route `/users/{user}`, `req.param("user")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Parameter names in the order the route declares them.
    pub fn param_names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    /// The value bound to a route parameter.
    pub fn route(&self, key: &str) -> Option<&Bound> {
        self.bindings.get(key)
    }
}

#[cfg(test)]
impl Request {
    /// A request with the given parameters bound, for exercising middleware directly.
    pub(crate) fn bound(path: &str, bindings: Vec<(&str, Bound)>) -> Self {
        let params = bindings.iter().map(|(k, _)| ((*k).to_owned(), String::new())).collect();
        let bindings = bindings.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
        Self::new(Method::Get, path.to_owned(), HeaderMap::new(), Bytes::new(), params, bindings)
    }
}
