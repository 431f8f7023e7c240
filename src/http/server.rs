//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single fallback handler
//! - Wire up tower-http layers (tracing, timeout, body limit)
//! - Convert between axum messages and the core's `Request`/`Response`
//! - Run the synchronous core off the async workers
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request as AxumRequest, State},
    http::StatusCode,
    response::Response as AxumResponse,
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::Application;
use crate::config::ServerConfig;
use crate::error::DispatchError;
use crate::http::request::Request;
use crate::http::response::Response;

/// State injected into the fallback handler.
#[derive(Clone)]
struct ServerState {
    app: Arc<Application>,
    max_body_bytes: usize,
}

/// HTTP transport around an [`Application`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server. The application is frozen from here on.
    pub fn new(app: Application, config: ServerConfig) -> Self {
        let state = ServerState {
            app: Arc::new(app),
            max_body_bytes: config.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: ServerState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for embedding or driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.request_timeout_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Every request lands here; routing happens in the application.
async fn dispatch_handler(State(state): State<ServerState>, request: AxumRequest) -> AxumResponse {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
            return into_axum(Response::json(
                StatusCode::PAYLOAD_TOO_LARGE,
                &json!({ "error": "Request body too large or unreadable." }),
            ));
        }
    };

    let request = Request::from_parts(parts.method, parts.uri, parts.headers, bytes);
    let app = state.app.clone();

    // The core blocks (and the tokio driver owns its own runtime).
    let response = match tokio::task::spawn_blocking(move || app.respond(request)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            DispatchError::handler(e).to_response()
        }
    };

    into_axum(response)
}

/// Convert a core response into an axum response.
pub fn into_axum(response: Response) -> AxumResponse {
    let (status, headers, body) = response.into_parts();
    let mut out = AxumResponse::new(Body::from(body));
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{HeaderName, HeaderValue};

    #[test]
    fn test_into_axum_keeps_status_and_headers() {
        let response = Response::text(StatusCode::CREATED, "made").with_header(
            HeaderName::from_static("x-custom"),
            HeaderValue::from_static("1"),
        );
        let out = into_axum(response);
        assert_eq!(out.status(), StatusCode::CREATED);
        assert_eq!(out.headers()["x-custom"], "1");
        assert!(out.headers().contains_key("content-type"));
    }
}
