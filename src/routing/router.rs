//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching (method, path)
//! - Return the match or an explicit `RouteNotFound`
//!
//! # Design Decisions
//! - First match wins: more specific routes must be registered before more
//!   general overlapping ones
//! - O(n) scan over routes (tables are built once at startup)
//! - No locking: registration completes before serving begins

use std::sync::Arc;

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::routing::definition::RouteDefinition;
use crate::routing::matcher::ParamMap;

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub route: Arc<RouteDefinition>,
    pub params: ParamMap,
    /// Handler requires suspend-capable dispatch.
    pub is_async: bool,
}

/// Ordered collection of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<RouteDefinition>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    ///
    /// A route whose method and template duplicate an earlier one can never be
    /// reached; this is logged but not rejected.
    pub fn add(&mut self, definition: RouteDefinition) -> Arc<RouteDefinition> {
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method() == definition.method() && r.path() == definition.path())
        {
            tracing::warn!(
                method = %definition.method(),
                path = %definition.path(),
                shadowed_by = existing.name().unwrap_or("<unnamed>"),
                "Route is shadowed by an earlier registration"
            );
        }

        tracing::debug!(
            method = %definition.method(),
            path = %definition.path(),
            is_async = definition.is_async(),
            "Route registered"
        );

        let definition = Arc::new(definition);
        self.routes.push(definition.clone());
        definition
    }

    /// Find the first route matching the method and path.
    pub fn match_route(&self, method: &str, path: &str) -> Result<MatchResult, DispatchError> {
        let method = method.to_ascii_uppercase();

        for route in &self.routes {
            if let Some(params) = route.matches(&method, path) {
                return Ok(MatchResult {
                    route: route.clone(),
                    params,
                    is_async: route.is_async(),
                });
            }
        }

        Err(DispatchError::RouteNotFound {
            method,
            path: path.to_string(),
        })
    }

    /// Find the first route matching a request.
    pub fn match_request(&self, request: &Request) -> Result<MatchResult, DispatchError> {
        self.match_route(request.method().as_str(), request.path())
    }

    pub fn routes(&self) -> &[Arc<RouteDefinition>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Drop every route. Intended for tests and resets.
    pub fn clear(&mut self) {
        self.routes.clear();
    }
}
