//! Chain construction.
//!
//! # Responsibilities
//! - Wrap a terminal handler in an ordered list of middleware
//! - Preserve registration order: the first middleware runs first
//!
//! # Design Decisions
//! - The list is walked in reverse, each step wrapping the current chain,
//!   which yields `mw[0](mw[1](...mw[n](terminal)))`
//! - A chain is built fresh per request and owns no shared mutable state

use std::sync::Arc;

use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::pipeline::middleware::{Handler, Middleware, Next};

struct Layer {
    middleware: Arc<dyn Middleware>,
    next: Box<dyn Handler>,
}

impl Handler for Layer {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        self.middleware.process(request, Next::new(self.next.as_ref()))
    }
}

/// A composed, invocable chain.
pub struct Pipeline {
    head: Box<dyn Handler>,
    depth: usize,
}

impl Pipeline {
    pub fn invoke(&self, request: Request) -> Result<Response, DispatchError> {
        self.head.handle(request)
    }

    /// Number of middleware layers around the terminal handler.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Handler for Pipeline {
    fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        self.invoke(request)
    }
}

/// Builds pipelines from middleware lists.
pub struct PipelineBuilder;

impl PipelineBuilder {
    pub fn build<H>(middleware: Vec<Arc<dyn Middleware>>, terminal: H) -> Pipeline
    where
        H: Handler + 'static,
    {
        let depth = middleware.len();
        let mut current: Box<dyn Handler> = Box::new(terminal);
        for layer in middleware.into_iter().rev() {
            current = Box::new(Layer {
                middleware: layer,
                next: current,
            });
        }
        Pipeline {
            head: current,
            depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::middleware::from_fn;
    use axum::http::header::{HeaderName, HeaderValue};
    use axum::http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn request() -> Request {
        Request::new(Method::GET, "/".parse().unwrap())
    }

    fn recording(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> Arc<dyn Middleware> {
        Arc::new(from_fn(move |req, next| {
            log.lock().unwrap().push(format!("{label}:before"));
            let response = next.run(req)?;
            log.lock().unwrap().push(format!("{label}:after"));
            Ok(response.with_header(
                HeaderName::from_static("x-last-layer"),
                HeaderValue::from_static(label),
            ))
        }))
    }

    #[test]
    fn test_first_registered_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let terminal_log = log.clone();
        let terminal = move |_req: Request| -> Result<Response, DispatchError> {
            terminal_log.lock().unwrap().push("T".to_string());
            Ok(Response::text(StatusCode::OK, "done"))
        };

        let pipeline = PipelineBuilder::build(
            vec![recording(log.clone(), "A"), recording(log.clone(), "B")],
            terminal,
        );
        let response = pipeline.invoke(request()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            ["A:before", "B:before", "T", "B:after", "A:after"]
        );
        // The outermost layer's response is what the caller sees.
        assert_eq!(response.header("x-last-layer"), Some("A"));
        assert_eq!(pipeline.depth(), 2);
    }

    #[test]
    fn test_short_circuit_skips_terminal() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let terminal = move |_req: Request| -> Result<Response, DispatchError> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Response::text(StatusCode::OK, "secret"))
        };
        let deny: Arc<dyn Middleware> =
            Arc::new(from_fn(|_req, _next| Ok(Response::text(StatusCode::FORBIDDEN, "no"))));

        let response = PipelineBuilder::build(vec![deny], terminal)
            .invoke(request())
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_middleware_can_replace_request() {
        let rewrite: Arc<dyn Middleware> = Arc::new(from_fn(|req: Request, next| {
            next.run(req.with_attribute("user", "ada"))
        }));
        let terminal = |req: Request| -> Result<Response, DispatchError> {
            Ok(Response::text(
                StatusCode::OK,
                req.attribute("user").unwrap_or("anonymous").to_string(),
            ))
        };

        let response = PipelineBuilder::build(vec![rewrite], terminal)
            .invoke(request())
            .unwrap();
        assert_eq!(response.body_text(), "ada");
    }

    #[test]
    fn test_calling_next_twice_runs_terminal_twice() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let terminal = move |_req: Request| -> Result<Response, DispatchError> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Response::text(StatusCode::OK, "ok"))
        };
        let twice: Arc<dyn Middleware> = Arc::new(from_fn(|req: Request, next| {
            next.run(req.clone())?;
            next.run(req)
        }));

        PipelineBuilder::build(vec![twice], terminal)
            .invoke(request())
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_chain_is_terminal() {
        let terminal =
            |_req: Request| -> Result<Response, DispatchError> { Ok(Response::text(StatusCode::OK, "bare")) };
        let pipeline = PipelineBuilder::build(Vec::new(), terminal);
        assert_eq!(pipeline.invoke(request()).unwrap().body_text(), "bare");
    }

    #[test]
    fn test_errors_propagate_through_layers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let terminal = |_req: Request| -> Result<Response, DispatchError> {
            Err(DispatchError::UnresolvableParameter { name: "id".into() })
        };
        let pipeline = PipelineBuilder::build(vec![recording(log.clone(), "A")], terminal);

        let err = pipeline.invoke(request()).unwrap_err();
        assert!(matches!(err, DispatchError::UnresolvableParameter { .. }));
        assert_eq!(*log.lock().unwrap(), ["A:before"]);
    }
}
