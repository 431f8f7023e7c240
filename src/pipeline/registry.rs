//! Middleware units and name-based resolution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binding::Container;
use crate::error::DispatchError;
use crate::pipeline::middleware::Middleware;

/// Alias chains longer than this are treated as a loop.
const MAX_ALIAS_DEPTH: usize = 8;

/// Produces a middleware instance, optionally using the container.
pub type MiddlewareFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Middleware>, DispatchError> + Send + Sync>;

/// A middleware as declared on a route or globally.
///
/// Resolution happens once per request-handling pass; instances are not cached
/// across requests unless the factory itself returns a shared instance.
#[derive(Clone)]
pub enum MiddlewareUnit {
    /// Ready to use.
    Instance(Arc<dyn Middleware>),
    /// Looked up in the [`MiddlewareRegistry`].
    Named(String),
    /// Called to produce an instance.
    Factory(MiddlewareFactory),
}

impl MiddlewareUnit {
    pub fn instance<M: Middleware + 'static>(middleware: M) -> Self {
        MiddlewareUnit::Instance(Arc::new(middleware))
    }

    pub fn named(name: impl Into<String>) -> Self {
        MiddlewareUnit::Named(name.into())
    }

    pub fn factory<F, M>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<M, DispatchError> + Send + Sync + 'static,
        M: Middleware + 'static,
    {
        MiddlewareUnit::Factory(Arc::new(
            move |container: &Container| -> Result<Arc<dyn Middleware>, DispatchError> {
                Ok(Arc::new(factory(container)?))
            },
        ))
    }
}

impl From<&str> for MiddlewareUnit {
    fn from(name: &str) -> Self {
        MiddlewareUnit::named(name)
    }
}

impl From<String> for MiddlewareUnit {
    fn from(name: String) -> Self {
        MiddlewareUnit::Named(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareUnit {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareUnit::Instance(middleware)
    }
}

impl fmt::Debug for MiddlewareUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareUnit::Instance(_) => f.write_str("Instance(..)"),
            MiddlewareUnit::Named(name) => f.debug_tuple("Named").field(name).finish(),
            MiddlewareUnit::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Name → middleware map used to resolve [`MiddlewareUnit::Named`].
#[derive(Debug, Default, Clone)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, MiddlewareUnit>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, unit: impl Into<MiddlewareUnit>) {
        self.entries.insert(name.into(), unit.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Produce an instance for one unit.
    pub fn resolve(
        &self,
        unit: &MiddlewareUnit,
        container: &Container,
    ) -> Result<Arc<dyn Middleware>, DispatchError> {
        let mut current = unit;
        for _ in 0..=MAX_ALIAS_DEPTH {
            match current {
                MiddlewareUnit::Instance(instance) => return Ok(instance.clone()),
                MiddlewareUnit::Factory(factory) => {
                    return factory(container).map_err(|e| match e {
                        DispatchError::MiddlewareResolution(_) => e,
                        other => DispatchError::MiddlewareResolution(format!(
                            "middleware factory failed: {other}"
                        )),
                    });
                }
                MiddlewareUnit::Named(name) => {
                    current = self.entries.get(name).ok_or_else(|| {
                        DispatchError::MiddlewareResolution(format!(
                            "Middleware {name} does not exist in the map."
                        ))
                    })?;
                }
            }
        }

        Err(DispatchError::MiddlewareResolution(format!(
            "alias chain for {unit:?} exceeds {MAX_ALIAS_DEPTH} levels"
        )))
    }

    /// Resolve units in order, failing on the first that cannot be produced.
    pub fn resolve_all<'a, I>(
        &self,
        units: I,
        container: &Container,
    ) -> Result<Vec<Arc<dyn Middleware>>, DispatchError>
    where
        I: IntoIterator<Item = &'a MiddlewareUnit>,
    {
        units
            .into_iter()
            .map(|unit| self.resolve(unit, container))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Request;
    use crate::http::response::Response;
    use crate::pipeline::middleware::{from_fn, Next};
    use axum::http::StatusCode;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn process(&self, _request: Request, _next: Next<'_>) -> Result<Response, DispatchError> {
            Ok(Response::text(StatusCode::OK, self.0))
        }
    }

    fn label(middleware: &Arc<dyn Middleware>) -> String {
        let terminal = |_req: Request| -> Result<Response, DispatchError> {
            Ok(Response::text(StatusCode::OK, "terminal"))
        };
        let request = Request::new(axum::http::Method::GET, "/".parse().unwrap());
        middleware
            .process(request, Next::new(&terminal))
            .unwrap()
            .body_text()
    }

    #[test]
    fn test_resolves_instance_named_and_factory() {
        let container = Container::new();
        container.set_instance(String::from("from-container"));

        let mut registry = MiddlewareRegistry::new();
        registry.register("tag", MiddlewareUnit::instance(Tag("named")));
        registry.register("alias", "tag");

        let instance = registry
            .resolve(&MiddlewareUnit::instance(Tag("direct")), &container)
            .unwrap();
        assert_eq!(label(&instance), "direct");

        let named = registry.resolve(&"alias".into(), &container).unwrap();
        assert_eq!(label(&named), "named");

        let factory = MiddlewareUnit::factory(|c: &Container| {
            let value = c.get::<String>()?;
            let text: &'static str = if value.as_str() == "from-container" { "built" } else { "?" };
            Ok(Tag(text))
        });
        let built = registry.resolve(&factory, &container).unwrap();
        assert_eq!(label(&built), "built");
    }

    #[test]
    fn test_unknown_name_fails() {
        let registry = MiddlewareRegistry::new();
        let err = match registry.resolve(&"auth".into(), &Container::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected resolution failure"),
        };
        assert!(matches!(err, DispatchError::MiddlewareResolution(msg) if msg.contains("auth")));
    }

    #[test]
    fn test_alias_loop_fails() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("a", "b");
        registry.register("b", "a");
        assert!(registry.resolve(&"a".into(), &Container::new()).is_err());
    }

    #[test]
    fn test_failing_factory_is_resolution_error() {
        let registry = MiddlewareRegistry::new();
        let unit = MiddlewareUnit::factory(|c: &Container| {
            c.get::<u64>()?;
            Ok(from_fn(|req, next| next.run(req)))
        });
        let err = match registry.resolve(&unit, &Container::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected resolution failure"),
        };
        assert!(matches!(err, DispatchError::MiddlewareResolution(_)));
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("first", MiddlewareUnit::instance(Tag("1")));
        registry.register("second", MiddlewareUnit::instance(Tag("2")));

        let units = vec![MiddlewareUnit::named("first"), MiddlewareUnit::named("second")];
        let resolved = registry.resolve_all(&units, &Container::new()).unwrap();
        let labels: Vec<String> = resolved.iter().map(label).collect();
        assert_eq!(labels, ["1", "2"]);
    }
}
