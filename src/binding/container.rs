//! Resolution registry keyed by Rust type.
//!
//! # Responsibilities
//! - Hold pre-built instances and lazily-invoked factories
//! - Resolve a key to a shared instance (`has` / `get`)
//! - Cache factory results as process-wide singletons
//!
//! # Design Decisions
//! - Lookups go through `DashMap` so request threads never contend on a
//!   single lock
//! - Each factory binding owns its own init cell; concurrent first calls
//!   serialize on it and the factory runs once
//! - Resolved instances are shared (`Arc`); types holding per-request mutable
//!   state must bring their own synchronization

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::error::DispatchError;

/// Type-erased shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Container) -> Result<Instance, DispatchError> + Send + Sync>;

/// Identifies a binding by Rust type.
#[derive(Debug, Clone, Copy)]
pub struct BindingKey {
    id: TypeId,
    name: &'static str,
}

impl BindingKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BindingKey {}

impl std::hash::Hash for BindingKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Clone)]
enum Binding {
    Instance(Instance),
    Factory {
        build: Factory,
        cell: Arc<Mutex<Option<Instance>>>,
    },
}

/// Registry mapping types to shared instances.
#[derive(Default)]
pub struct Container {
    bindings: DashMap<BindingKey, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a ready-made value.
    pub fn set_instance<T: Send + Sync + 'static>(&self, value: T) {
        self.set_shared(Arc::new(value));
    }

    /// Bind an already shared value.
    pub fn set_shared<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.bindings
            .insert(BindingKey::of::<T>(), Binding::Instance(value));
    }

    /// Bind a factory. It runs on first `get` and its result is cached.
    pub fn set_factory<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, DispatchError> + Send + Sync + 'static,
    {
        let key = BindingKey::of::<T>();
        let build: Factory = Arc::new(move |container: &Container| -> Result<Instance, DispatchError> {
            let value = factory(container)?;
            Ok(Arc::new(value))
        });
        self.bindings.insert(
            key,
            Binding::Factory {
                build,
                cell: Arc::new(Mutex::new(None)),
            },
        );
    }

    pub fn has(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.has(&BindingKey::of::<T>())
    }

    /// Resolve a key to its type-erased instance.
    ///
    /// A factory that fails leaves its cell empty, so the next call retries.
    pub fn resolve(&self, key: &BindingKey) -> Result<Instance, DispatchError> {
        // Clone out of the map so a factory may resolve its own dependencies.
        let binding = self
            .bindings
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::UnknownBinding(key.name().to_string()))?;

        match binding {
            Binding::Instance(instance) => Ok(instance),
            Binding::Factory { build, cell } => {
                let mut slot = cell.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(instance) = slot.as_ref() {
                    return Ok(instance.clone());
                }
                let built = build(self)?;
                tracing::debug!(binding = key.name(), "Factory binding resolved");
                *slot = Some(built.clone());
                Ok(built)
            }
        }
    }

    /// Resolve a typed instance.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DispatchError> {
        let key = BindingKey::of::<T>();
        self.resolve(&key)?
            .downcast::<T>()
            .map_err(|_| DispatchError::UnknownBinding(key.name().to_string()))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.bindings.iter().map(|e| e.key().name()).collect();
        f.debug_struct("Container").field("bindings", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    struct Counter(AtomicUsize);

    #[test]
    fn test_instance_binding() {
        let container = Container::new();
        container.set_instance(Greeter {
            greeting: "hello".into(),
        });

        assert!(container.contains::<Greeter>());
        assert_eq!(container.get::<Greeter>().unwrap().greeting, "hello");
    }

    #[test]
    fn test_factory_runs_once_and_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        let seen = calls.clone();
        container.set_factory(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Counter(AtomicUsize::new(0)))
        });

        let a = container.get::<Counter>().unwrap();
        let b = container.get::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_runs_once_under_concurrent_first_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = Arc::new(Container::new());
        let seen = calls.clone();
        container.set_factory(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(7u32)
        });

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    container.get::<u32>().unwrap()
                })
            })
            .collect();
        let resolved: Vec<Arc<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    }

    #[test]
    fn test_failed_factory_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        let seen = calls.clone();
        container.set_factory(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DispatchError::handler("not yet"))
            } else {
                Ok(1u64)
            }
        });

        assert!(container.get::<u64>().is_err());
        assert_eq!(*container.get::<u64>().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_can_resolve_dependencies() {
        let container = Container::new();
        container.set_instance(Greeter {
            greeting: "hi".into(),
        });
        container.set_factory(|c| {
            let greeter = c.get::<Greeter>()?;
            Ok(format!("{} there", greeter.greeting))
        });

        assert_eq!(*container.get::<String>().unwrap(), "hi there");
    }

    #[test]
    fn test_unknown_binding() {
        let container = Container::new();
        assert!(!container.contains::<Greeter>());
        match container.get::<Greeter>() {
            Err(DispatchError::UnknownBinding(name)) => assert!(name.contains("Greeter")),
            other => panic!("expected UnknownBinding, got {other:?}"),
        }
    }

    #[test]
    fn test_rebinding_replaces_cached_instance() {
        let container = Container::new();
        container.set_factory(|_| Ok(1u32));
        assert_eq!(*container.get::<u32>().unwrap(), 1);

        container.set_instance(2u32);
        assert_eq!(*container.get::<u32>().unwrap(), 2);
    }
}
