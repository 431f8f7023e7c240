//! Response value produced by handlers and middleware.
//!
//! # Responsibilities
//! - Immutable status + headers + body
//! - JSON / text / HTML constructors with the matching content type
//!
//! # Design Decisions
//! - Builder-style `with_header` returns a new value
//! - JSON encoding failures degrade to a fixed error payload instead of panicking

use axum::body::Bytes;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";
const ENCODE_FAILURE: &str = r#"{"error":"Unable to encode response payload."}"#;

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn json<T: Serialize + ?Sized>(status: StatusCode, data: &T) -> Self {
        let body = match serde_json::to_vec(data) {
            Ok(encoded) => Bytes::from(encoded),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode JSON response");
                Bytes::from_static(ENCODE_FAILURE.as_bytes())
            }
        };
        Self::with_content_type(status, JSON, body)
    }

    pub fn text(status: StatusCode, content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self::with_content_type(status, TEXT, content)
    }

    pub fn html(status: StatusCode, content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self::with_content_type(status, HTML, content)
    }

    fn with_content_type(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self::new(status, headers, body)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}

/// Response builder resolvable from the container.
///
/// Handlers that declare a `ResponseFactory` parameter receive the shared
/// instance registered by the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFactory;

impl ResponseFactory {
    pub fn json<T: Serialize + ?Sized>(&self, data: &T, status: StatusCode) -> Response {
        Response::json(status, data)
    }

    pub fn text(&self, content: impl Into<String>, status: StatusCode) -> Response {
        Response::text(status, content)
    }

    pub fn html(&self, content: impl Into<String>, status: StatusCode) -> Response {
        Response::html(status, content)
    }
}
