//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};
use easyroute::{
    from_fn, Arguments, DispatchError, HandlerDescriptor, Middleware, Request, Response,
    RouteHandler,
};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

/// Core request for `method path`.
pub fn request(method: Method, path: &str) -> Request {
    Request::new(method, path.parse().unwrap())
}

pub fn get(path: &str) -> Request {
    request(Method::GET, path)
}

/// Core POST request with a JSON body.
pub fn post_json(path: &str, body: &Value) -> Request {
    request(Method::POST, path)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_body(body.to_string())
}

pub fn json_body(response: &Response) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

/// Handler echoing the parameters it declared as JSON.
pub fn echo_handler(descriptor: HandlerDescriptor) -> RouteHandler {
    let names: Vec<String> = descriptor.params().iter().map(|p| p.name().to_string()).collect();
    RouteHandler::blocking(descriptor, move |args: Arguments| {
        let mut out = serde_json::Map::new();
        for name in &names {
            out.insert(name.clone(), args.value(name)?.clone());
        }
        Ok(Value::Object(out))
    })
}

/// Middleware that appends `label` to `log` on the way in and out.
pub fn recording(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> impl Middleware {
    from_fn(move |req: Request, next| {
        log.lock().unwrap().push(format!("{label}>"));
        let response = next.run(req);
        log.lock().unwrap().push(format!("<{label}"));
        response
    })
}

/// Middleware answering 401 without calling the rest of the chain.
pub fn deny() -> impl Middleware {
    from_fn(|_req: Request, _next| -> Result<Response, DispatchError> {
        Ok(Response::text(StatusCode::UNAUTHORIZED, "denied"))
    })
}

/// Drive an axum router once and collect status, headers and body.
pub async fn send(
    router: axum::Router,
    request: axum::http::Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

/// Send a raw HTTP/1.1 request over TCP and return the full response text.
pub async fn raw_http(addr: std::net::SocketAddr, request: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    socket.read_to_end(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}
