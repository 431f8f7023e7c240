//! Parameter binding.
//!
//! # Resolution order (per parameter)
//! 1. Request-typed → the current request
//! 2. Response-factory-typed → the shared factory from the container
//! 3. Service-typed and registered → the container instance
//! 4. Route parameter with the same name → coerced to the declared scalar
//! 5. Reserved names `body` / `query` → decoded body / query mapping
//! 6. Declared default
//! 7. Otherwise `UnresolvableParameter`
//!
//! Typed dependencies are checked before name-based binding so that a route
//! parameter can never shadow them.

use serde_json::{Map, Value};

use crate::binding::arguments::{Argument, Arguments};
use crate::binding::container::{BindingKey, Container};
use crate::binding::descriptor::{coerce, HandlerDescriptor, ParamKind, ParamSpec, ScalarType};
use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::ResponseFactory;
use crate::routing::ParamMap;

const BODY: &str = "body";
const QUERY: &str = "query";

/// Supplies handler arguments from the request, route parameters and container.
pub struct ParameterBinder<'a> {
    container: &'a Container,
}

impl<'a> ParameterBinder<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Bind every declared parameter, failing on the first unresolvable one.
    pub fn bind(
        &self,
        descriptor: &HandlerDescriptor,
        request: &Request,
        params: &ParamMap,
    ) -> Result<Arguments, DispatchError> {
        let mut arguments = Arguments::new();
        for spec in descriptor.params() {
            let argument = self.resolve(spec, request, params)?;
            arguments.push(spec.name(), argument);
        }
        Ok(arguments)
    }

    fn resolve(
        &self,
        spec: &ParamSpec,
        request: &Request,
        params: &ParamMap,
    ) -> Result<Argument, DispatchError> {
        let name = spec.name();

        match spec.kind() {
            ParamKind::Request => Ok(Argument::Request(request.clone())),
            ParamKind::ResponseFactory => {
                let factory = self.container.resolve(&BindingKey::of::<ResponseFactory>())?;
                Ok(Argument::Service(factory))
            }
            ParamKind::Service(key) => {
                if self.container.has(key) {
                    return Ok(Argument::Service(self.container.resolve(key)?));
                }
                match params.get(name) {
                    Some(raw) => Ok(Argument::Value(coerce(raw, ScalarType::Untyped))),
                    None => Err(unresolvable(name)),
                }
            }
            ParamKind::Scalar(ty) => self.resolve_scalar(spec, *ty, request, params),
        }
    }

    fn resolve_scalar(
        &self,
        spec: &ParamSpec,
        ty: ScalarType,
        request: &Request,
        params: &ParamMap,
    ) -> Result<Argument, DispatchError> {
        let name = spec.name();

        if let Some(raw) = params.get(name) {
            return Ok(Argument::Value(coerce(raw, ty)));
        }

        if name == BODY {
            return Ok(Argument::Value(request.parsed_body()));
        }

        if name == QUERY {
            let query = request
                .query_params()
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<_, _>>();
            return Ok(Argument::Value(Value::Object(query)));
        }

        if let Some(default) = spec.default_value() {
            return Ok(Argument::Value(default.clone()));
        }

        if ty == ScalarType::Array {
            return Ok(Argument::Value(params.to_json()));
        }

        Err(unresolvable(name))
    }
}

fn unresolvable(name: &str) -> DispatchError {
    tracing::debug!(parameter = name, "Handler parameter could not be bound");
    DispatchError::UnresolvableParameter {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{self, HeaderValue};
    use axum::http::Method;
    use serde_json::json;

    struct Mailer {
        from: &'static str,
    }

    fn request(uri: &str) -> Request {
        Request::new(Method::GET, uri.parse().unwrap())
    }

    fn params(pairs: &[(&str, &str)]) -> ParamMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_request_type_wins_over_route_param() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().request("id");

        let args = binder
            .bind(&descriptor, &request("/users/42"), &params(&[("id", "42")]))
            .unwrap();
        assert_eq!(args.request("id").unwrap().path(), "/users/42");
    }

    #[test]
    fn test_route_param_is_coerced() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().int("id").untyped("slug");

        let args = binder
            .bind(
                &descriptor,
                &request("/"),
                &params(&[("id", "42"), ("slug", "hello-world")]),
            )
            .unwrap();
        assert_eq!(args.int("id").unwrap(), 42);
        assert_eq!(args.str("slug").unwrap(), "hello-world");
    }

    #[test]
    fn test_service_from_container() {
        let container = Container::new();
        container.set_instance(Mailer { from: "noreply" });
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().service::<Mailer>("mailer");

        let args = binder
            .bind(&descriptor, &request("/"), &params(&[("mailer", "shadow")]))
            .unwrap();
        assert_eq!(args.service::<Mailer>("mailer").unwrap().from, "noreply");
    }

    #[test]
    fn test_unregistered_service_falls_back_to_route_param() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().service::<Mailer>("mailer");

        let args = binder
            .bind(&descriptor, &request("/"), &params(&[("mailer", "smtp")]))
            .unwrap();
        assert_eq!(args.str("mailer").unwrap(), "smtp");

        let err = binder
            .bind(&descriptor, &request("/"), &ParamMap::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnresolvableParameter { name } if name == "mailer"));
    }

    #[test]
    fn test_response_factory_is_resolved() {
        let container = Container::new();
        container.set_instance(ResponseFactory);
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().response_factory("responses");

        let args = binder.bind(&descriptor, &request("/"), &ParamMap::new()).unwrap();
        assert!(args.response_factory("responses").is_ok());
    }

    #[test]
    fn test_reserved_body_and_query() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().untyped("body").untyped("query");

        let req = request("/items?page=2&sort=name")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(r#"{"title":"hi"}"#);
        let args = binder.bind(&descriptor, &req, &ParamMap::new()).unwrap();

        assert_eq!(args.value("body").unwrap(), &json!({"title": "hi"}));
        assert_eq!(args.value("query").unwrap(), &json!({"page": "2", "sort": "name"}));
    }

    #[test]
    fn test_route_param_named_body_takes_precedence() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let descriptor = HandlerDescriptor::new().string("body");

        let args = binder
            .bind(&descriptor, &request("/"), &params(&[("body", "segment")]))
            .unwrap();
        assert_eq!(args.str("body").unwrap(), "segment");
    }

    #[test]
    fn test_default_then_array_then_error() {
        let container = Container::new();
        let binder = ParameterBinder::new(&container);
        let route_params = params(&[("id", "9")]);

        let descriptor = HandlerDescriptor::new().int("page").with_default(1);
        let args = binder.bind(&descriptor, &request("/"), &route_params).unwrap();
        assert_eq!(args.int("page").unwrap(), 1);

        let descriptor = HandlerDescriptor::new().array("all");
        let args = binder.bind(&descriptor, &request("/"), &route_params).unwrap();
        assert_eq!(args.value("all").unwrap(), &json!({"id": "9"}));

        let descriptor = HandlerDescriptor::new().int("missing");
        let err = binder.bind(&descriptor, &request("/"), &route_params).unwrap_err();
        assert!(matches!(err, DispatchError::UnresolvableParameter { name } if name == "missing"));
    }
}
