use std::sync::Arc;

use axum::http::Method;

use crate::binding::{Container, ParameterBinder};
use crate::config::DispatchConfig;
use crate::dispatch::DispatchGate;
use crate::error::DispatchError;
use crate::handler::RouteHandler;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseFactory};
use crate::pipeline::{Handler, MiddlewareRegistry, MiddlewareUnit, PipelineBuilder};
use crate::routing::{ParamMap, RouteDefinition, RouteOptions, RouteTable};

/// Routes, middleware, bindings and the dispatch gate, wired together.
pub struct Application {
    routes: RouteTable,
    container: Arc<Container>,
    registry: MiddlewareRegistry,
    global: Vec<MiddlewareUnit>,
    gate: Arc<DispatchGate>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl Application {
    pub fn new(dispatch: DispatchConfig) -> Self {
        Self::with_gate(DispatchGate::new(dispatch))
    }

    /// Application using an explicitly constructed gate.
    pub fn with_gate(gate: DispatchGate) -> Self {
        let container = Container::new();
        container.set_instance(ResponseFactory);

        Self {
            routes: RouteTable::new(),
            container: Arc::new(container),
            registry: MiddlewareRegistry::new(),
            global: Vec::new(),
            gate: Arc::new(gate),
        }
    }

    /// Register a route. Fails when the method is unsupported or the path
    /// template is malformed.
    pub fn route(
        &mut self,
        method: &str,
        path: &str,
        handler: RouteHandler,
        options: RouteOptions,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        let definition = RouteDefinition::new(method, path, handler, options)?;
        Ok(self.routes.add(definition))
    }

    pub fn get(
        &mut self,
        path: &str,
        handler: RouteHandler,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        self.route(Method::GET.as_str(), path, handler, RouteOptions::default())
    }

    pub fn post(
        &mut self,
        path: &str,
        handler: RouteHandler,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        self.route(Method::POST.as_str(), path, handler, RouteOptions::default())
    }

    pub fn put(
        &mut self,
        path: &str,
        handler: RouteHandler,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        self.route(Method::PUT.as_str(), path, handler, RouteOptions::default())
    }

    pub fn patch(
        &mut self,
        path: &str,
        handler: RouteHandler,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        self.route(Method::PATCH.as_str(), path, handler, RouteOptions::default())
    }

    pub fn delete(
        &mut self,
        path: &str,
        handler: RouteHandler,
    ) -> Result<Arc<RouteDefinition>, DispatchError> {
        self.route(Method::DELETE.as_str(), path, handler, RouteOptions::default())
    }

    /// Make a middleware available by name to routes and other aliases.
    pub fn register_middleware(&mut self, name: impl Into<String>, unit: impl Into<MiddlewareUnit>) {
        self.registry.register(name, unit);
    }

    /// Add middleware that runs for every route, before route middleware.
    pub fn use_middleware(&mut self, unit: impl Into<MiddlewareUnit>) {
        self.global.push(unit.into());
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn dispatch_gate(&self) -> &DispatchGate {
        &self.gate
    }

    /// Run a request through matching, middleware, binding and dispatch.
    pub fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        let matched = self.routes.match_request(&request)?;
        tracing::debug!(
            method = %request.method(),
            path = %request.path(),
            route = %matched.route.path(),
            is_async = matched.is_async,
            "Route matched"
        );

        let request = matched
            .params
            .iter()
            .fold(request, |req, (name, value)| req.with_attribute(name, value));

        let units = self.global.iter().chain(matched.route.middleware());
        let middleware = self.registry.resolve_all(units, &self.container)?;

        let core = CoreHandler {
            route: matched.route,
            params: matched.params,
            is_async: matched.is_async,
            container: self.container.clone(),
            gate: self.gate.clone(),
        };

        PipelineBuilder::build(middleware, core).invoke(request)
    }

    /// Like [`handle`](Self::handle), but converts errors into responses.
    pub fn respond(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();

        match self.handle(request) {
            Ok(response) => response,
            Err(err @ DispatchError::RouteNotFound { .. }) => {
                tracing::warn!(method = %method, path = %path, "No route matched");
                err.to_response()
            }
            Err(err) => {
                tracing::error!(method = %method, path = %path, error = %err, "Request failed");
                err.to_response()
            }
        }
    }
}

/// Innermost handler: bind arguments, dispatch, normalize the reply.
struct CoreHandler {
    route: Arc<RouteDefinition>,
    params: ParamMap,
    is_async: bool,
    container: Arc<Container>,
    gate: Arc<DispatchGate>,
}

impl Handler for CoreHandler {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        let handler = self.route.handler();
        let arguments =
            ParameterBinder::new(&self.container).bind(handler.descriptor(), &request, &self.params)?;

        let reply = self
            .gate
            .dispatch(handler.invocation(arguments), self.is_async)?;

        let factory = self.container.get::<ResponseFactory>()?;
        Ok(reply.into_response(&factory))
    }
}
