//! Unified error type.

use http::StatusCode;
use thiserror::Error;
use tracing::{debug, error};

use crate::response::{IntoResponse, Response};

/// Everything that can go wrong while declaring or evaluating an expiring route.
///
/// Build-time variants (`InvalidAmount`, `UndefinedMethod`) come out of the
/// [`Declaration`](crate::middleware::Declaration) builder. The rest surface at
/// request time and are turned into responses by [`IntoResponse`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("The path [{path}] has no route parameter to find an expiration.")]
    MissingParameter { path: String },

    #[error("No query results for model [{model}] {key}")]
    ModelNotFound { model: String, key: String },

    #[error("Not Found")]
    NotFound,

    #[error("The amount cannot be below 1, {0} issued.")]
    InvalidAmount(i64),

    #[error("Call to undefined method {class}::{method}()")]
    UndefinedMethod { class: &'static str, method: String },

    #[error("Could not parse [{0}] as a timestamp.")]
    InvalidTimestamp(String),

    #[error("Could not parse [{0}] as an interval.")]
    InvalidInterval(String),

    #[error("Middleware [{0}] is not registered.")]
    UnknownMiddleware(String),
}

impl Error {
    /// The HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelNotFound { .. } | Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 404s carry their message; server errors are logged and answered generically.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            error!(error = %self, "request failed");
            status.canonical_reason().unwrap_or_default().to_owned()
        } else {
            debug!(error = %self, "request rejected");
            self.to_string()
        };

        Response::builder().status(status).text(body).with_error(self)
    }
}
