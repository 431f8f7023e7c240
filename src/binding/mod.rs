//! Handler parameter binding subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     HandlerDescriptor (declared parameter list, built once)
//!
//! Per request:
//!     (descriptor, request, route params, container)
//!     → binder.rs (fixed resolution order)
//!     → Arguments (positional, named lookup retained)
//!     → handler invocation
//! ```
//!
//! # Design Decisions
//! - No runtime type inspection: descriptors are explicit data
//! - Container instances are shared singletons

pub mod arguments;
pub mod binder;
pub mod container;
pub mod descriptor;

pub use arguments::{Argument, Arguments};
pub use binder::ParameterBinder;
pub use container::{BindingKey, Container, Instance};
pub use descriptor::{coerce, HandlerDescriptor, ParamKind, ParamSpec, ScalarType};
