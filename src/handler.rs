//! Route handlers and their results.
//!
//! A handler is registered together with a [`HandlerDescriptor`] declaring its
//! parameters. Whether it is suspend-capable is fixed by the constructor used
//! (`blocking` or `suspendable`), so dispatch mode is known at registration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};

use crate::binding::{Arguments, HandlerDescriptor};
use crate::dispatch::Invocation;
use crate::error::DispatchError;
use crate::http::response::{Response, ResponseFactory};

type BlockingFn = dyn Fn(Arguments) -> Result<Reply, DispatchError> + Send + Sync;
type SuspendableFn =
    dyn Fn(Arguments) -> BoxFuture<'static, Result<Reply, DispatchError>> + Send + Sync;

/// Value returned by a handler before normalization into a [`Response`].
#[derive(Debug, Clone)]
pub enum Reply {
    Response(Response),
    Json(Value),
    Text(String),
}

impl Reply {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Reply::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Normalize into a response.
    ///
    /// Objects and arrays become JSON bodies, scalars and null are wrapped as
    /// `{"data": value}`, text becomes `text/plain`.
    pub fn into_response(self, factory: &ResponseFactory) -> Response {
        match self {
            Reply::Response(response) => response,
            Reply::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                factory.json(&value, StatusCode::OK)
            }
            Reply::Json(scalar) => factory.json(&json!({ "data": scalar }), StatusCode::OK),
            Reply::Text(text) => factory.text(text, StatusCode::OK),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<i64> for Reply {
    fn from(n: i64) -> Self {
        Reply::Json(Value::from(n))
    }
}

impl From<f64> for Reply {
    fn from(n: f64) -> Self {
        Reply::Json(Value::from(n))
    }
}

impl From<bool> for Reply {
    fn from(b: bool) -> Self {
        Reply::Json(Value::Bool(b))
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Json(Value::Null)
    }
}

/// The callable behind a route.
#[derive(Clone)]
pub enum HandlerFn {
    /// Runs to completion on the calling thread.
    Blocking(Arc<BlockingFn>),
    /// May yield; driven by the dispatch driver.
    Suspendable(Arc<SuspendableFn>),
}

/// Handler plus its parameter declaration.
#[derive(Clone)]
pub struct RouteHandler {
    descriptor: HandlerDescriptor,
    func: HandlerFn,
}

impl RouteHandler {
    pub fn blocking<F, R>(descriptor: HandlerDescriptor, f: F) -> Self
    where
        F: Fn(Arguments) -> Result<R, DispatchError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        Self {
            descriptor,
            func: HandlerFn::Blocking(Arc::new(
                move |args: Arguments| -> Result<Reply, DispatchError> { f(args).map(Into::into) },
            )),
        }
    }

    pub fn suspendable<F, Fut, R>(descriptor: HandlerDescriptor, f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
        R: Into<Reply>,
    {
        Self {
            descriptor,
            func: HandlerFn::Suspendable(Arc::new(
                move |args: Arguments| -> BoxFuture<'static, Result<Reply, DispatchError>> {
                    f(args).map(|result| result.map(Into::<Reply>::into)).boxed()
                },
            )),
        }
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    pub fn is_async(&self) -> bool {
        matches!(self.func, HandlerFn::Suspendable(_))
    }

    /// Bind the handler to its arguments, producing a unit of work for the gate.
    pub fn invocation(&self, args: Arguments) -> Invocation {
        match &self.func {
            HandlerFn::Blocking(f) => {
                let f = f.clone();
                Invocation::Blocking(Box::new(move || f(args)))
            }
            HandlerFn::Suspendable(f) => Invocation::Suspendable(f(args)),
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("descriptor", &self.descriptor)
            .field("is_async", &self.is_async())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_reply_is_wrapped_in_data() {
        let response = Reply::from(42i64).into_response(&ResponseFactory);
        assert_eq!(response.body_text(), r#"{"data":42}"#);

        let response = Reply::from(()).into_response(&ResponseFactory);
        assert_eq!(response.body_text(), r#"{"data":null}"#);
    }

    #[test]
    fn test_object_reply_is_json() {
        let response = Reply::from(json!({"id": 1})).into_response(&ResponseFactory);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body_text(), r#"{"id":1}"#);
    }

    #[test]
    fn test_text_reply_is_plain_text() {
        let response = Reply::from("pong").into_response(&ResponseFactory);
        assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(response.body_text(), "pong");
    }

    #[test]
    fn test_response_reply_passes_through() {
        let original = Response::text(StatusCode::ACCEPTED, "queued");
        let response = Reply::from(original).into_response(&ResponseFactory);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_async_classification_is_static() {
        let sync = RouteHandler::blocking(HandlerDescriptor::new(), |_| Ok("x"));
        let suspendable =
            RouteHandler::suspendable(HandlerDescriptor::new(), |_| async { Ok::<_, DispatchError>("x") });
        assert!(!sync.is_async());
        assert!(suspendable.is_async());
    }
}
