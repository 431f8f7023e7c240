//! easyroute server binary.
//!
//! Loads configuration (optional TOML file), installs logging, registers a
//! small demo API and serves it until Ctrl+C.

use std::path::PathBuf;

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use easyroute::config::{load_config, AppConfig};
use easyroute::http::{CsrfMiddleware, RequestIdMiddleware};
use easyroute::lifecycle::{wait_for_ctrl_c, Shutdown};
use easyroute::observability::init_logging;
use easyroute::{
    yield_now, Application, Arguments, DispatchError, HandlerDescriptor, HttpServer,
    MiddlewareUnit, RouteHandler, RouteOptions,
};

#[derive(Parser)]
#[command(name = "easyroute")]
#[command(about = "Serve the easyroute demo API", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

/// Demo service resolved from the container.
struct Greeter {
    greeting: String,
}

fn build_app(config: &AppConfig) -> Result<Application, DispatchError> {
    let mut app = Application::new(config.dispatch.clone());
    app.container().set_instance(Greeter {
        greeting: "Hello".to_string(),
    });

    let csrf = CsrfMiddleware::default();
    app.register_middleware("csrf", MiddlewareUnit::instance(csrf.clone()));
    app.use_middleware(MiddlewareUnit::instance(RequestIdMiddleware));

    app.get(
        "/",
        RouteHandler::blocking(HandlerDescriptor::new(), |_args: Arguments| {
            Ok(json!({ "name": "easyroute", "version": env!("CARGO_PKG_VERSION") }))
        }),
    )?;

    app.get(
        "/users/{id}/posts/{slug}",
        RouteHandler::blocking(
            HandlerDescriptor::new().int("id").string("slug"),
            |args: Arguments| Ok(json!({ "id": args.int("id")?, "slug": args.str("slug")? })),
        ),
    )?;

    app.get(
        "/hello/{name}",
        RouteHandler::blocking(
            HandlerDescriptor::new().service::<Greeter>("greeter").string("name"),
            |args: Arguments| {
                let greeter = args.service::<Greeter>("greeter")?;
                Ok(format!("{}, {}!", greeter.greeting, args.str("name")?))
            },
        ),
    )?;

    app.get(
        "/search",
        RouteHandler::blocking(HandlerDescriptor::new().array("query"), |args: Arguments| {
            Ok(json!({ "query": args.value("query")?.clone() }))
        }),
    )?;

    app.post(
        "/echo",
        RouteHandler::blocking(
            HandlerDescriptor::new().untyped("body").response_factory("responses"),
            |args: Arguments| {
                let responses = args.response_factory("responses")?;
                Ok(responses.json(args.value("body")?, StatusCode::CREATED))
            },
        ),
    )?;

    app.get(
        "/countdown/{steps}",
        RouteHandler::suspendable(HandlerDescriptor::new().int("steps"), |args: Arguments| async move {
            let steps = args.int("steps")?.clamp(0, 1_000);
            for _ in 0..steps {
                yield_now().await;
            }
            Ok::<_, DispatchError>(json!({ "resumed": steps }))
        }),
    )?;

    let issuer = csrf.clone();
    app.get(
        "/forms/token",
        RouteHandler::blocking(HandlerDescriptor::new(), move |_args: Arguments| {
            Ok(json!({ "_csrf": issuer.generate_token() }))
        }),
    )?;

    app.route(
        "POST",
        "/forms/{id}",
        RouteHandler::blocking(
            HandlerDescriptor::new().int("id").untyped("body"),
            |args: Arguments| Ok(json!({ "form": args.int("id")?, "accepted": args.value("body")?.clone() })),
        ),
        RouteOptions::new()
            .middleware("csrf")
            .name("forms.submit")
            .summary("Submit a form guarded by a CSRF token"),
    )?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.server.bind_address,
        driver = ?config.dispatch.driver,
        "easyroute v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let app = build_app(&config)?;
    tracing::info!(routes = app.routes().len(), "Routes registered");

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(app, config.server.clone());

    let shutdown = Shutdown::new();
    let stopped = shutdown.wait();
    let trigger = shutdown.clone();
    tokio::spawn(async move { wait_for_ctrl_c(&trigger).await });

    server.run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
