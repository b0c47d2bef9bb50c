//! Demo application assembled from configuration.
//!
//! # Routes
//! ```text
//! GET ^/hello/(?P<name>\w+)$    → hello → log
//! GET ^/private/(?P<name>\w+)$  → basic auth → hello → log   (when [auth] is set)
//! GET ^/session$                → sessions → session page → log
//! GET ^<static prefix>/         → static files → log          (when [static_files] is set)
//! *   (default)                 → 404 → log
//! ```
//!
//! The log handler is mandatory everywhere, so rejected and not-found
//! requests still produce an access log line.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, Request, StatusCode};
use bytes::Bytes;

use crate::config::ServerConfig;
use crate::handlers::{static_files, BasicAuth, LogFormatError, LogHandler, Sessions};
use crate::pipeline::{handler_fn, mandatory, Handler, Pipe, ResponseSink};
use crate::routing::{PathVars, RouteError, Router};

/// Errors while assembling the application router.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("invalid access log format: {0}")]
    LogFormat(#[from] LogFormatError),
}

/// Build the router for `config`.
pub fn build_router(config: &ServerConfig) -> Result<Router, AppError> {
    let log = Arc::new(LogHandler::new(&config.observability.access_log_format)?);
    let access_log = || mandatory(log.clone());
    let mut router = Router::new();

    router
        .route(
            r"^/hello/(?P<name>\w+)$",
            Pipe::new()
                .name("hello")
                .handler(Hello)
                .handler(access_log()),
        )?
        .methods([Method::GET]);

    if let Some(auth) = &config.auth {
        router
            .route(
                r"^/private/(?P<name>\w+)$",
                Pipe::new()
                    .name("private")
                    .handler(BasicAuth::new(
                        auth.realm.as_str(),
                        &auth.username,
                        &auth.password,
                    ))
                    .handler(Hello)
                    .handler(access_log()),
            )?
            .methods([Method::GET]);
    }

    let sessions = Arc::new(Sessions::new(config.sessions.clone()));
    router
        .route(
            "^/session$",
            Pipe::new()
                .name("session")
                .handler(sessions.clone())
                .handler(SessionPage { sessions })
                .handler(access_log()),
        )?
        .methods([Method::GET]);

    if let Some(files) = &config.static_files {
        let pattern = format!("^{}/", regex::escape(files.prefix.trim_end_matches('/')));
        router
            .route(
                &pattern,
                Pipe::new()
                    .name("static")
                    .handler(
                        static_files(&files.prefix, &files.dir)
                            .max_body_bytes(files.max_file_bytes),
                    )
                    .handler(access_log()),
            )?
            .methods([Method::GET, Method::HEAD]);
    }

    router.set_default(
        Pipe::new()
            .name("default")
            .handler(handler_fn(|w, _| {
                w.error(StatusCode::NOT_FOUND, "404 page not found")
            }))
            .handler(access_log()),
    );

    Ok(router)
}

/// Greets the `name` captured from the path.
struct Hello;

#[async_trait]
impl Handler for Hello {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        let name = req
            .extensions()
            .get::<PathVars>()
            .and_then(|vars| vars.get("name"))
            .unwrap_or("stranger");
        sink.write(format!("Hello, {name}\n"));
    }
}

/// Prints the session id issued or recognized by [`Sessions`].
struct SessionPage {
    sessions: Arc<Sessions>,
}

#[async_trait]
impl Handler for SessionPage {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        match self.sessions.session_id(sink, req) {
            Ok(id) => sink.write(format!("SessionID: {id}\n")),
            Err(err) => {
                sink.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                sink.register_error(err);
            }
        }
    }
}
