//! Request correlation IDs.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Expose it to handlers through the request headers
//! - Echo it on the response
//!
//! # Design Decisions
//! - A client-supplied `x-request-id` is kept as-is
//! - Should run first so every later log line can carry the ID

use axum::http::header::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::{Middleware, Next};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Ensures `x-request-id` on the request and copies it to the response.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn process(&self, mut request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        let name = HeaderName::from_static(X_REQUEST_ID);
        let id = match request.headers().get(&name) {
            Some(existing) => existing.clone(),
            None => {
                let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                    .map_err(DispatchError::handler)?;
                request.headers_mut().insert(name.clone(), generated.clone());
                generated
            }
        };

        tracing::debug!(request_id = ?id, path = %request.path(), "Request ID assigned");
        let response = next.run(request)?;

        if response.headers().contains_key(&name) {
            Ok(response)
        } else {
            Ok(response.with_header(name, id))
        }
    }
}
