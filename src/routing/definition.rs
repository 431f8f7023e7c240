//! Immutable route definitions.

use axum::http::Method;

use crate::error::DispatchError;
use crate::handler::RouteHandler;
use crate::pipeline::MiddlewareUnit;
use crate::routing::matcher::{CompiledPattern, ParamMap};

/// Verbs a route may be registered for.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Optional per-route settings.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Route-specific middleware, run after the global middleware.
    pub middleware: Vec<MiddlewareUnit>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn middleware(mut self, unit: impl Into<MiddlewareUnit>) -> Self {
        self.middleware.push(unit.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A registered route: verb, compiled template, handler and middleware.
///
/// The template is compiled exactly once, at construction.
#[derive(Debug)]
pub struct RouteDefinition {
    method: Method,
    pattern: CompiledPattern,
    handler: RouteHandler,
    options: RouteOptions,
}

impl RouteDefinition {
    pub fn new(
        method: &str,
        path: &str,
        handler: RouteHandler,
        options: RouteOptions,
    ) -> Result<Self, DispatchError> {
        let method = parse_method(method)
            .ok_or_else(|| DispatchError::malformed(path, format!("unsupported method '{method}'")))?;
        let pattern = CompiledPattern::compile(path)?;

        Ok(Self {
            method,
            pattern,
            handler,
            options,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    pub fn middleware(&self) -> &[MiddlewareUnit] {
        &self.options.middleware
    }

    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.options.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.options.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.options.tags
    }

    /// Whether the handler needs the suspend-capable dispatch path.
    pub fn is_async(&self) -> bool {
        self.handler.is_async()
    }

    /// Match a method and path. Method comparison is case-insensitive.
    pub fn matches(&self, method: &str, path: &str) -> Option<ParamMap> {
        if !method.eq_ignore_ascii_case(self.method.as_str()) {
            return None;
        }
        self.pattern.matches(path)
    }
}

/// Normalize to upper case and accept only the supported verbs.
fn parse_method(method: &str) -> Option<Method> {
    let upper = method.to_ascii_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
}
