//! End-to-end tests over a real socket.

use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use pipemux::app::build_router;
use pipemux::config::{AuthConfig, ServerConfig};
use pipemux::pipeline::{handler_fn, mandatory, Pipe};
use pipemux::routing::Router;

mod common;

fn text(body: &'static str) -> Pipe {
    Pipe::new().handler(handler_fn(move |w, _| w.write(body)))
}

#[tokio::test]
async fn test_routes_and_default() {
    let mut router = Router::new();
    router
        .route("^/h1$", text("h1"))
        .unwrap()
        .methods([Method::GET, Method::POST]);
    router.route("^/h2$", text("h2")).unwrap();
    router.set_default(text("h2"));

    let server = common::spawn_server(ServerConfig::default(), router).await;
    let client = common::client();

    for (method, path, expected) in [
        (reqwest::Method::GET, "/h1", "h1"),
        (reqwest::Method::POST, "/h1", "h1"),
        (reqwest::Method::PUT, "/h1", "h2"),
        (reqwest::Method::GET, "/h2", "h2"),
        (reqwest::Method::GET, "/elsewhere", "h2"),
    ] {
        let response = client
            .request(method.clone(), server.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "{method} {path}");
        assert_eq!(response.text().await.unwrap(), expected, "{method} {path}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_not_found_without_default() {
    let server = common::spawn_server(ServerConfig::default(), Router::new()).await;

    let response = common::client()
        .get(server.url("/nothing"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND.as_u16());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "404 page not found\n");

    server.stop().await;
}

#[tokio::test]
async fn test_mandatory_handler_sees_errors_after_termination() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let pipe = Pipe::new()
        .handler(handler_fn(|w, _| {
            w.register_error("first");
            w.error(StatusCode::FORBIDDEN, "Forbidden");
            w.register_error("second");
        }))
        .handler(handler_fn(|w, _| w.write("never")))
        .handler(mandatory(handler_fn(move |w, _| {
            let mut seen = recorder.lock().unwrap();
            seen.extend(w.errors().iter().map(|e| e.to_string()));
            w.headers_mut().insert("x-late", "ignored".parse().unwrap());
        })));

    let mut router = Router::new();
    router.route("^/guarded$", pipe).unwrap();
    let server = common::spawn_server(ServerConfig::default(), router).await;

    let response = common::client()
        .get(server.url("/guarded"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN.as_u16());
    assert!(response.headers().get("x-late").is_none());
    assert_eq!(response.text().await.unwrap(), "Forbidden\n");
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);

    server.stop().await;
}

#[tokio::test]
async fn test_demo_app_auth_and_sessions() {
    let config = ServerConfig {
        auth: Some(AuthConfig {
            realm: "hello".to_string(),
            username: "user".to_string(),
            password: "password123".to_string(),
        }),
        ..ServerConfig::default()
    };
    let router = build_router(&config).unwrap();
    let server = common::spawn_server(config, router).await;
    let client = common::client();

    let response = client
        .get(server.url("/private/gopher"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED.as_u16());
    assert_eq!(
        response.headers().get("www-authenticate").unwrap(),
        "Basic realm=\"hello\""
    );

    let response = client
        .get(server.url("/private/gopher"))
        .basic_auth("user", Some("password123"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "Hello, gopher\n");

    let response = client.get(server.url("/session")).send().await.unwrap();
    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let first = response.text().await.unwrap();
    assert!(first.starts_with("SessionID: "));

    let response = client
        .get(server.url("/session"))
        .header("cookie", cookie)
        .send()
        .await
        .unwrap();
    assert!(response.headers().get("set-cookie").is_none());
    assert_eq!(response.text().await.unwrap(), first);

    server.stop().await;
}

#[tokio::test]
async fn test_body_limit_over_socket() {
    let mut router = Router::new();
    router
        .route(
            "^/upload$",
            Pipe::new().handler(handler_fn(|w, req| w.write(format!("{}", req.body().len())))),
        )
        .unwrap();
    let mut config = ServerConfig::default();
    config.limits.max_body_bytes = 8;
    let server = common::spawn_server(config, router).await;
    let client = common::client();

    let response = client
        .post(server.url("/upload"))
        .body("12345")
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "5");

    let response = client
        .post(server.url("/upload"))
        .body("this body is too large")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE.as_u16());

    server.stop().await;
}
