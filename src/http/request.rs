//! Request value consumed by the routing core.
//!
//! # Responsibilities
//! - Carry method, URI, headers and the buffered body
//! - Expose decoded query string and body for parameter binding
//! - Hold string attributes (route parameters are copied here after a match)
//!
//! # Design Decisions
//! - Plain value type: cloning is cheap (`Bytes` body) and no state is shared
//!   between requests
//! - Header access is case-insensitive (`HeaderMap`)

use std::collections::{BTreeMap, HashMap};

use axum::body::Bytes;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, Uri};
use serde_json::{Map, Value};

/// An already-parsed HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    attributes: HashMap<String, String>,
}

impl Request {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            attributes: HashMap::new(),
        }
    }

    /// Assemble a request from transport-level parts.
    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            attributes: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Decoded query string. Repeated keys keep the last value.
    pub fn query_params(&self) -> BTreeMap<String, String> {
        self.uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// Body decoded according to the content type.
    ///
    /// Empty body yields `{}`. JSON that fails to parse also yields `{}`.
    /// Unknown content types are returned as a raw string.
    pub fn parsed_body(&self) -> Value {
        if self.body.is_empty() {
            return Value::Object(Map::new());
        }

        let content_type = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains("application/json") {
            return serde_json::from_slice(&self.body).unwrap_or_else(|_| Value::Object(Map::new()));
        }

        if content_type.contains("application/x-www-form-urlencoded") {
            let fields = url::form_urlencoded::parse(&self.body)
                .into_owned()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<_, _>>();
            return Value::Object(fields);
        }

        Value::String(String::from_utf8_lossy(&self.body).into_owned())
    }
}
