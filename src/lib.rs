//! In-process HTTP request-handling core.
//!
//! Route matching, middleware pipelines, handler parameter binding and
//! synchronous or suspendable dispatch, plus an axum transport so the
//! result can be served.
//!
//! ```text
//!  Request ─▶ RouteTable ─▶ Pipeline[ global mw ─▶ route mw ─▶ core ] ─▶ Response
//!                                                               │
//!                                     ParameterBinder ◀─────────┤
//!                                     DispatchGate (sync | driver)
//! ```

pub mod app;
pub mod binding;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use app::Application;
pub use binding::{Arguments, Container, HandlerDescriptor};
pub use config::AppConfig;
pub use dispatch::{yield_now, DispatchGate};
pub use error::DispatchError;
pub use handler::{Reply, RouteHandler};
pub use http::{HttpServer, Request, Response, ResponseFactory};
pub use lifecycle::Shutdown;
pub use pipeline::{from_fn, Middleware, MiddlewareUnit, Next};
pub use routing::{RouteOptions, RouteTable};
