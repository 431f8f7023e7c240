//! HTTP messages, built-in middleware and the transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers, body buffering)
//!     → request.rs (core Request: method, URI, headers, bytes, attributes)
//!     → Application (routing, pipeline, dispatch)
//!     → response.rs (core Response, ResponseFactory)
//!     → server.rs converts back → client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{CsrfMiddleware, RequestIdMiddleware, X_REQUEST_ID};
pub use request::Request;
pub use response::{Response, ResponseFactory};
pub use server::HttpServer;
