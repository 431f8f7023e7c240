//! Sync vs. suspendable dispatch through the application.

use std::sync::Arc;

use axum::http::StatusCode;
use easyroute::config::{DispatchConfig, DriverKind};
use easyroute::dispatch::{DispatchGate, InlineDriver};
use easyroute::{yield_now, Application, Arguments, DispatchError, HandlerDescriptor, RouteHandler};
use serde_json::{json, Value};

mod common;

fn app_with(driver: DriverKind) -> Application {
    let mut app = Application::new(DispatchConfig {
        driver,
        max_resumes: 100,
        timeout_ms: 2_000,
    });

    app.get(
        "/sync/{id}",
        RouteHandler::blocking(HandlerDescriptor::new().int("id"), |args: Arguments| {
            Ok(json!({ "id": args.int("id")? }))
        }),
    )
    .unwrap();

    app.get(
        "/async/{id}",
        RouteHandler::suspendable(HandlerDescriptor::new().int("id"), |args: Arguments| async move {
            let id = args.int("id")?;
            Ok::<_, DispatchError>(json!({ "id": id }))
        }),
    )
    .unwrap();

    app.get(
        "/yielding/{times}",
        RouteHandler::suspendable(HandlerDescriptor::new().int("times"), |args: Arguments| async move {
            let times = args.int("times")?;
            for _ in 0..times {
                yield_now().await;
            }
            Ok::<_, DispatchError>(json!({ "times": times }))
        }),
    )
    .unwrap();

    app
}

fn body(app: &Application, path: &str) -> Value {
    let response = app.handle(common::get(path)).unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    common::json_body(&response)
}

#[test]
fn test_async_and_sync_are_observably_equivalent() {
    for driver in [DriverKind::Inline, DriverKind::Cooperative, DriverKind::Tokio] {
        let app = app_with(driver);
        assert_eq!(body(&app, "/sync/42"), body(&app, "/async/42"), "{driver:?}");
    }
}

#[test]
fn test_suspending_handler_is_resumed() {
    for driver in [DriverKind::Cooperative, DriverKind::Tokio] {
        let app = app_with(driver);
        assert_eq!(body(&app, "/yielding/5"), json!({ "times": 5 }), "{driver:?}");
    }
}

#[test]
fn test_inline_driver_stalls_on_suspension() {
    let app = app_with(DriverKind::Inline);
    let err = app.handle(common::get("/yielding/1")).unwrap_err();
    assert!(matches!(err, DispatchError::DispatchStalled { .. }));
    assert_eq!(
        app.respond(common::get("/yielding/1")).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_resume_budget_exhaustion_stalls() {
    let app = app_with(DriverKind::Cooperative);
    let err = app.handle(common::get("/yielding/500")).unwrap_err();
    assert!(matches!(err, DispatchError::DispatchStalled { driver: "cooperative", .. }));
}

#[test]
fn test_handler_errors_are_not_swallowed() {
    let mut app = Application::default();
    app.get(
        "/fail",
        RouteHandler::suspendable(HandlerDescriptor::new(), |_args: Arguments| async {
            yield_now().await;
            Err::<Value, _>(DispatchError::handler("database offline"))
        }),
    )
    .unwrap();

    let err = app.handle(common::get("/fail")).unwrap_err();
    assert!(err.to_string().contains("database offline"));
}

#[test]
fn test_explicit_gate_driver() {
    let mut app = Application::with_gate(DispatchGate::with_driver(Arc::new(InlineDriver)));
    app.get(
        "/async",
        RouteHandler::suspendable(HandlerDescriptor::new(), |_args: Arguments| async {
            Ok::<_, DispatchError>("inline")
        }),
    )
    .unwrap();

    assert_eq!(app.handle(common::get("/async")).unwrap().body_text(), "inline");
    assert_eq!(app.dispatch_gate().driver().unwrap().name(), "inline");
    assert!(matches!(
        app.dispatch_gate().use_driver(Arc::new(InlineDriver)),
        Err(DispatchError::DriverLocked)
    ));
}

#[test]
fn test_concurrent_requests_share_one_application() {
    let app = Arc::new(app_with(DriverKind::Cooperative));
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            std::thread::spawn(move || {
                let response = app.handle(common::get(&format!("/yielding/{i}"))).unwrap();
                common::json_body(&response)["times"].as_i64().unwrap()
            })
        })
        .collect();

    let mut seen: Vec<i64> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..8).collect::<Vec<i64>>());
}
