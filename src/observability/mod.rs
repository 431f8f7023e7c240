//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / pipeline / dispatch / transport produce:
//!     → tracing events (match, dispatch mode, short-circuits, failures)
//!     → tower-http TraceLayer spans per HTTP request
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, plain fmt)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the pipeline as the `x-request-id` header
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
