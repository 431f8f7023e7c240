//! Error taxonomy for routing, binding, and dispatch.
//!
//! # Propagation
//! - `MalformedRoute` is raised at registration time and should abort startup
//! - Every other variant is per-request and is converted into an error
//!   response by the outermost caller (see [`DispatchError::to_response`])
//! - The core never swallows an error to fabricate a default response

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::http::response::Response;

/// Boxed error raised from inside a handler or middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the request-handling core.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Route template could not be compiled.
    #[error("Malformed route '{path}': {reason}")]
    MalformedRoute { path: String, reason: String },

    /// No registered route matches the request.
    #[error("Route does not exist: {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// A handler argument could not be bound.
    #[error("Unable to resolve value for parameter {name}")]
    UnresolvableParameter { name: String },

    /// A named or factory middleware could not be produced.
    #[error("Middleware resolution failed: {0}")]
    MiddlewareResolution(String),

    /// A suspended handler never reached completion.
    #[error("Dispatch stalled on {driver} driver: {reason}")]
    DispatchStalled { driver: &'static str, reason: String },

    /// Registry lookup for a key with no binding.
    #[error("No entry found for identifier {0}")]
    UnknownBinding(String),

    /// The configured scheduler backend could not be started.
    #[error("Dispatch driver unavailable: {0}")]
    DriverUnavailable(String),

    /// Driver override attempted after the gate already resolved one.
    #[error("Dispatch driver already resolved; switching drivers mid-run is unsupported")]
    DriverLocked,

    /// Failure raised by user code.
    #[error("Handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl DispatchError {
    /// Wrap an arbitrary error raised by a handler.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DispatchError::Handler(err.into())
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        DispatchError::MalformedRoute {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status the transport layer should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured error response, consistent with normal JSON output.
    pub fn to_response(&self) -> Response {
        let payload = match self {
            DispatchError::RouteNotFound { method, path } => json!({
                "error": "Route not found",
                "method": method,
                "path": path,
            }),
            other => json!({ "error": other.to_string() }),
        };
        Response::json(self.status(), &payload)
    }
}
