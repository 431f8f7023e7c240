//! Application facade.
//!
//! # Data Flow
//! ```text
//! Registration (startup, &mut Application):
//!     route(method, path, handler, options) → RouteTable
//!     register_middleware(name, unit) / use_middleware(unit)
//!     container().set_instance(...)
//!
//! Per request (&Application, any thread):
//!     RouteTable::match_request → route + params
//!     → params copied into request attributes
//!     → global units ++ route units resolved by MiddlewareRegistry
//!     → Pipeline around the core:
//!         ParameterBinder::bind → RouteHandler::invocation
//!         → DispatchGate::dispatch → Reply::into_response
//! ```
//!
//! # Design Decisions
//! - Registration needs `&mut`, handling only `&`: routes are frozen once
//!   the application is shared
//! - `handle` returns errors; `respond` is the transport-edge conversion

pub mod application;

pub use application::Application;
