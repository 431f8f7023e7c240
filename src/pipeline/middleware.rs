//! Handler and middleware contracts.

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;

/// Anything that turns a request into a response.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Response, DispatchError>;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Result<Response, DispatchError> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        self(request)
    }
}

/// A layer wrapping the rest of the chain.
///
/// `process` may inspect or replace the request, must return a response, and
/// continues the chain by calling `next.run` at most once. Not calling it
/// short-circuits the request. Calling it twice runs the rest of the chain
/// twice; nothing prevents that.
pub trait Middleware: Send + Sync {
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError>;
}

/// The remainder of the chain, handed to each middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    inner: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(inner: &'a dyn Handler) -> Self {
        Self { inner }
    }

    /// Continue with the next layer (or the terminal handler).
    pub fn run(&self, request: Request) -> Result<Response, DispatchError> {
        self.inner.handle(request)
    }
}

/// Middleware built from a closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next<'_>) -> Result<Response, DispatchError> + Send + Sync,
{
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, DispatchError> {
        (self.f)(request, next)
    }
}

/// Adapt a closure into a [`Middleware`].
///
/// ```
/// use easyroute::pipeline::from_fn;
///
/// let passthrough = from_fn(|request, next| next.run(request));
/// # let _ = passthrough;
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next<'_>) -> Result<Response, DispatchError> + Send + Sync + 'static,
{
    FnMiddleware { f }
}
