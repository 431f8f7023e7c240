//! CSRF token verification.
//!
//! Unsafe methods (POST, PUT, DELETE) must carry a `_csrf` field in their
//! decoded body holding a token previously issued by [`CsrfMiddleware::generate_token`].
//! Tokens are single use. At most `limit` tokens are outstanding; issuing
//! more evicts the oldest.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::{Middleware, Next};

/// Form field carrying the token.
pub const CSRF_FORM_KEY: &str = "_csrf";

const DEFAULT_LIMIT: usize = 50;

/// Token store plus the checking middleware. Clones share the store.
#[derive(Debug, Clone)]
pub struct CsrfMiddleware {
    tokens: Arc<Mutex<VecDeque<String>>>,
    limit: usize,
    form_key: String,
}

impl Default for CsrfMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl CsrfMiddleware {
    pub fn new(limit: usize) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(VecDeque::new())),
            limit: limit.max(1),
            form_key: CSRF_FORM_KEY.to_string(),
        }
    }

    pub fn with_form_key(mut self, key: impl Into<String>) -> Self {
        self.form_key = key.into();
        self
    }

    pub fn form_key(&self) -> &str {
        &self.form_key
    }

    /// Issue a fresh token.
    pub fn generate_token(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut tokens = self.lock();
        tokens.push_back(token.clone());
        while tokens.len() > self.limit {
            tokens.pop_front();
        }
        token
    }

    /// Number of tokens that could still be redeemed.
    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    /// Redeem `token`; true when it was outstanding.
    fn consume(&self, token: &str) -> bool {
        let mut tokens = self.lock();
        match tokens.iter().position(|t| t == token) {
            Some(index) => {
                tokens.remove(index);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        // A poisoned store still holds valid tokens.
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn requires_token(method: &Method) -> bool {
        matches!(*method, Method::POST | Method::PUT | Method::DELETE)
    }
}

fn forbidden(message: &str) -> Response {
    Response::json(StatusCode::FORBIDDEN, &json!({ "error": message }))
}

impl Middleware for CsrfMiddleware {
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        if !Self::requires_token(request.method()) {
            return next.run(request);
        }

        let body = request.parsed_body();
        let token = match body.get(&self.form_key) {
            Some(value) => value.as_str().map(str::to_owned).unwrap_or_else(|| value.to_string()),
            None => {
                tracing::warn!(path = %request.path(), "CSRF token missing");
                return Ok(forbidden("CSRF token is required."));
            }
        };

        if !self.consume(&token) {
            tracing::warn!(path = %request.path(), "CSRF token rejected");
            return Ok(forbidden("This CSRF token is invalid."));
        }

        next.run(request)
    }
}
