//! Middleware pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Global units ++ route units (MiddlewareUnit: instance | name | factory)
//!     → registry.rs (resolve each unit once for this request)
//!     → builder.rs (wrap terminal handler, last unit innermost)
//!     → Pipeline::invoke(request)
//!         → mw[0].process(request, next) → ... → terminal
//!         ← response flows back out through each layer
//! ```
//!
//! # Design Decisions
//! - Plain trait objects and closures; no generated wrapper types
//! - Middleware never suspends: each layer completes before returning
//! - Chains are per request, so concurrent requests share nothing mutable

pub mod builder;
pub mod middleware;
pub mod registry;

pub use builder::{Pipeline, PipelineBuilder};
pub use middleware::{from_fn, FnMiddleware, Handler, Middleware, Next};
pub use registry::{MiddlewareFactory, MiddlewareRegistry, MiddlewareUnit};
