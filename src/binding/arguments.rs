//! Bound handler arguments.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::ResponseFactory;

/// A single bound argument.
#[derive(Clone)]
pub enum Argument {
    Request(Request),
    Service(Arc<dyn Any + Send + Sync>),
    Value(Value),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Request(req) => f
                .debug_tuple("Request")
                .field(req.method())
                .field(&req.path())
                .finish(),
            Argument::Service(_) => f.write_str("Service(..)"),
            Argument::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// Positional arguments, in the order the descriptor declared them.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    names: Vec<String>,
    values: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, argument: Argument) {
        self.names.push(name.into());
        self.values.push(argument);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at a position.
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    /// Argument by declared name.
    pub fn by_name(&self, name: &str) -> Option<&Argument> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    fn mismatch(name: &str) -> DispatchError {
        DispatchError::UnresolvableParameter {
            name: name.to_string(),
        }
    }

    pub fn request(&self, name: &str) -> Result<&Request, DispatchError> {
        match self.by_name(name) {
            Some(Argument::Request(req)) => Ok(req),
            _ => Err(Self::mismatch(name)),
        }
    }

    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, DispatchError> {
        match self.by_name(name) {
            Some(Argument::Service(instance)) => instance
                .clone()
                .downcast::<T>()
                .map_err(|_| Self::mismatch(name)),
            _ => Err(Self::mismatch(name)),
        }
    }

    pub fn response_factory(&self, name: &str) -> Result<Arc<ResponseFactory>, DispatchError> {
        self.service::<ResponseFactory>(name)
    }

    pub fn value(&self, name: &str) -> Result<&Value, DispatchError> {
        match self.by_name(name) {
            Some(Argument::Value(v)) => Ok(v),
            _ => Err(Self::mismatch(name)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, DispatchError> {
        self.value(name)?.as_i64().ok_or_else(|| Self::mismatch(name))
    }

    pub fn float(&self, name: &str) -> Result<f64, DispatchError> {
        self.value(name)?.as_f64().ok_or_else(|| Self::mismatch(name))
    }

    pub fn bool(&self, name: &str) -> Result<bool, DispatchError> {
        self.value(name)?.as_bool().ok_or_else(|| Self::mismatch(name))
    }

    pub fn str(&self, name: &str) -> Result<&str, DispatchError> {
        self.value(name)?.as_str().ok_or_else(|| Self::mismatch(name))
    }
}
