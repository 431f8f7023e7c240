//! Built-in middleware.
//!
//! Both run inside the dispatch pipeline, so they can be registered globally
//! with `Application::use_middleware`, by name, or per route.

pub mod csrf;
pub mod request_id;

pub use csrf::{CsrfMiddleware, CSRF_FORM_KEY};
pub use request_id::{RequestIdMiddleware, X_REQUEST_ID};
