//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at registration):
//!     (method, template, handler, options)
//!     → matcher.rs (template → anchored regex + parameter names)
//!     → definition.rs (immutable RouteDefinition)
//!     → router.rs (appended to RouteTable in registration order)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan routes in order)
//!     → definition.rs (method check, then path match)
//!     → Return: MatchResult { route, params, is_async } or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Templates compiled once, routes immutable afterwards
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod definition;
pub mod matcher;
pub mod router;

pub use definition::{RouteDefinition, RouteOptions, SUPPORTED_METHODS};
pub use matcher::{compile, CompiledPattern, ParamMap};
pub use router::{MatchResult, RouteTable};
